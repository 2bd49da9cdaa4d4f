//! Demo catalog loaded at startup.

use rust_decimal::Decimal;
use time::macros::datetime;

use crate::domain::entities::ProductRecord;

pub const CATEGORIES: [&str; 7] = [
    "Electrónicos",
    "Computadoras",
    "Audio",
    "Tablets",
    "Accesorios",
    "Gaming",
    "Hogar",
];

const SEED_OWNER: &str = "1";

pub fn categories() -> Vec<String> {
    CATEGORIES.iter().map(|c| (*c).to_string()).collect()
}

pub fn products() -> Vec<ProductRecord> {
    vec![
        product(
            "1",
            "Smartphone Samsung Galaxy S24",
            "Último modelo de Samsung con cámara de 200MP y pantalla AMOLED de 6.8 pulgadas",
            Decimal::new(299_999, 2),
            "Electrónicos",
            25,
            "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400",
            datetime!(2024-01-01 00:00 UTC),
        ),
        product(
            "2",
            "Laptop Dell XPS 13",
            "Laptop ultradelgada con procesador Intel Core i7 y 16GB de RAM",
            Decimal::new(459_999, 2),
            "Computadoras",
            15,
            "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400",
            datetime!(2024-01-02 00:00 UTC),
        ),
        product(
            "3",
            "Auriculares Sony WH-1000XM5",
            "Auriculares inalámbricos con cancelación de ruido activa",
            Decimal::new(89_999, 2),
            "Audio",
            40,
            "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400",
            datetime!(2024-01-03 00:00 UTC),
        ),
        product(
            "4",
            "Smart TV LG OLED 55\"",
            "Televisor OLED 4K con tecnología AI ThinQ y Dolby Vision",
            Decimal::new(329_999, 2),
            "Electrónicos",
            8,
            "https://images.unsplash.com/photo-1593359677879-a4bb92f829d1?w=400",
            datetime!(2024-01-04 00:00 UTC),
        ),
        product(
            "5",
            "Tablet iPad Pro 12.9\"",
            "iPad Pro con chip M2, pantalla Liquid Retina XDR y soporte para Apple Pencil",
            Decimal::new(399_999, 2),
            "Tablets",
            12,
            "https://images.unsplash.com/photo-1544244015-0df4b3ffc6b0?w=400",
            datetime!(2024-01-05 00:00 UTC),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    name: &str,
    description: &str,
    price: Decimal,
    category: &str,
    stock: i64,
    image_url: &str,
    created_at: time::OffsetDateTime,
) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        category: category.to_string(),
        stock,
        image_url: Some(image_url.to_string()),
        is_active: true,
        created_at,
        updated_at: created_at,
        created_by: SEED_OWNER.to_string(),
    }
}
