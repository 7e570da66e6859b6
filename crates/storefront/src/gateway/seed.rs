//! Demo catalog used by the in-memory backend.

use serde_json::{Value, json};

use super::Record;

fn rows(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn image(photo: &str) -> String {
    format!("https://images.unsplash.com/{photo}?w=400&h=500&fit=crop")
}

/// Six products, one per category. `created_at` increases with `id`.
#[must_use]
pub fn demo_products() -> Vec<Record> {
    rows(json!([
        {
            "id": 1,
            "name": "Vestido Floral Elegante",
            "description": "Vestido lindo com estampa floral, perfeito para ocasiões especiais. Tecido leve e confortável.",
            "price": 89.9,
            "category": "vestidos",
            "images": [image("photo-1515372039744-b8f02a3ae446")],
            "sizes": ["P", "M", "G", "GG"],
            "colors": ["Azul", "Rosa"],
            "inStock": true,
            "featured": true,
            "created_at": "2025-01-01T12:00:00Z",
            "updated_at": "2025-01-01T12:00:00Z"
        },
        {
            "id": 2,
            "name": "Blazer Feminino Clássico",
            "description": "Blazer elegante e versátil, ideal para o trabalho ou eventos formais. Corte moderno e confortável.",
            "price": 129.9,
            "category": "blazers",
            "images": [image("photo-1594633312681-425c7b97ccd1")],
            "sizes": ["P", "M", "G"],
            "colors": ["Preto", "Bege"],
            "inStock": true,
            "featured": true,
            "created_at": "2025-01-02T12:00:00Z",
            "updated_at": "2025-01-02T12:00:00Z"
        },
        {
            "id": 3,
            "name": "Calça Jeans Skinny",
            "description": "Calça jeans skinny de alta qualidade, com elastano para máximo conforto e movimento.",
            "price": 79.9,
            "category": "calcas",
            "images": [image("photo-1542272604-787c3835535d")],
            "sizes": ["36", "38", "40", "42", "44"],
            "colors": ["Azul", "Preto"],
            "inStock": true,
            "created_at": "2025-01-03T12:00:00Z",
            "updated_at": "2025-01-03T12:00:00Z"
        },
        {
            "id": 4,
            "name": "Blusa de Seda Premium",
            "description": "Blusa de seda natural, leve e elegante. Perfeita para combinar com calças ou saias.",
            "price": 69.9,
            "category": "blusas",
            "images": [image("photo-1564257631407-3deb25f7d8c9")],
            "sizes": ["P", "M", "G"],
            "colors": ["Branco", "Azul", "Rosa"],
            "inStock": true,
            "created_at": "2025-01-04T12:00:00Z",
            "updated_at": "2025-01-04T12:00:00Z"
        },
        {
            "id": 5,
            "name": "Saia Midi Plissada",
            "description": "Saia midi plissada com movimento elegante. Ideal para criar looks sofisticados e femininos.",
            "price": 59.9,
            "category": "saias",
            "images": [image("photo-1594633312681-425c7b97ccd1")],
            "sizes": ["P", "M", "G"],
            "colors": ["Preto", "Azul Marinho"],
            "inStock": true,
            "created_at": "2025-01-05T12:00:00Z",
            "updated_at": "2025-01-05T12:00:00Z"
        },
        {
            "id": 6,
            "name": "Conjunto Esportivo",
            "description": "Conjunto esportivo confortável e estiloso, perfeito para atividades físicas ou uso casual.",
            "price": 99.9,
            "category": "esportivo",
            "images": [image("photo-1571019613454-1cb2f99b2d8b")],
            "sizes": ["P", "M", "G"],
            "colors": ["Preto", "Azul"],
            "inStock": true,
            "created_at": "2025-01-06T12:00:00Z",
            "updated_at": "2025-01-06T12:00:00Z"
        }
    ]))
}

/// The six storefront categories.
#[must_use]
pub fn demo_categories() -> Vec<Record> {
    let names = [
        ("Vestidos", "Vestidos para todas as ocasiões"),
        ("Blazers", "Blazers e alfaiataria"),
        ("Calças", "Calças jeans e de tecido"),
        ("Blusas", "Blusas e camisas"),
        ("Saias", "Saias curtas, midi e longas"),
        ("Esportivo", "Moda fitness e casual"),
    ];

    let items = names
        .iter()
        .zip(1_i64..)
        .map(|((name, description), id)| {
            json!({
                "id": id,
                "name": name,
                "description": description,
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            })
        })
        .collect();
    rows(Value::Array(items))
}
