//! Ordering through WhatsApp.
//!
//! The store takes orders by chat: the product page links to `wa.me` with a
//! prefilled message naming the product and its price.

use marys_fashion_core::Product;

/// `https://wa.me/{number}?text=...` asking to order `product`.
///
/// The price is written with a decimal comma (`R$ 89,90`). The message is
/// percent-encoded the way browsers' `encodeURIComponent` does it.
#[must_use]
pub fn whatsapp_order_link(number: &str, product: &Product) -> String {
    let price = product.price.to_string().replace('.', ",");
    let message = format!(
        "Olá! Gostaria de fazer um pedido do produto: {} - R$ {price}",
        product.name
    );
    format!("https://wa.me/{number}?text={}", encode_component(&message))
}

/// Percent-encode, leaving `!'()*` literal as `encodeURIComponent` does.
fn encode_component(text: &str) -> String {
    urlencoding::encode(text)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marys_fashion_core::{Price, ProductId};

    use super::*;
    use crate::config::DEFAULT_WHATSAPP_NUMBER;

    fn product(name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(1),
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(cents).unwrap(),
            category: "vestidos".to_string(),
            images: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            in_stock: true,
            featured: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_order_link_message() {
        let link = whatsapp_order_link(DEFAULT_WHATSAPP_NUMBER, &product("Vestido Floral Elegante", 8990));
        assert_eq!(
            link,
            "https://wa.me/5563992345422?text=Ol%C3%A1!%20Gostaria%20de%20fazer%20um%20pedido%20do%20produto%3A%20Vestido%20Floral%20Elegante%20-%20R%24%2089%2C90"
        );
    }

    #[test]
    fn test_order_link_pads_cents_and_encodes_name() {
        let link = whatsapp_order_link("5511999999999", &product("Saia & Blusa (kit)", 15000));
        assert!(link.starts_with("https://wa.me/5511999999999?text="));
        assert!(link.contains("Saia%20%26%20Blusa%20(kit)"));
        assert!(link.ends_with("R%24%20150%2C00"));
    }
}
