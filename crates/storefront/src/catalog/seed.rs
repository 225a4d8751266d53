//! Built-in catalog.
//!
//! Used when `ECOMIFY_CATALOG_SOURCE=builtin`, as the fallback when the
//! backend cannot be read, and by `ecomify-cli catalog seed`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use ecomify_core::ProductId;

use super::Product;

struct Seed {
    id: i32,
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: Decimal,
    original_price: Option<Decimal>,
    brand: &'static str,
    category: &'static str,
    rating: f64,
    review_count: u32,
    stock: u32,
    tags: &'static [&'static str],
    featured: bool,
}

impl From<&Seed> for Product {
    fn from(seed: &Seed) -> Self {
        Self {
            id: ProductId::new(seed.id),
            name: seed.name.to_string(),
            slug: seed.slug.to_string(),
            description: seed.description.to_string(),
            price: seed.price,
            original_price: seed.original_price,
            brand: seed.brand.to_string(),
            category: seed.category.to_string(),
            rating: seed.rating,
            review_count: seed.review_count,
            stock: seed.stock,
            tags: seed.tags.iter().map(ToString::to_string).collect(),
            featured: seed.featured,
            image_url: Some(format!("/static/products/{}.webp", seed.slug)),
        }
    }
}

/// The built-in catalog, ordered by ID.
#[must_use]
pub fn builtin_products() -> Vec<Product> {
    SEEDS.iter().map(Product::from).collect()
}

const SEEDS: &[Seed] = &[
    Seed {
        id: 1,
        name: "iPhone 15 Pro 256GB",
        slug: "iphone-15-pro-256gb",
        description: "Smartphone com chip A17 Pro, câmera de 48MP e estrutura em titânio.",
        price: dec!(8999.00),
        original_price: Some(dec!(9999.00)),
        brand: "Apple",
        category: "Smartphones",
        rating: 4.8,
        review_count: 1247,
        stock: 15,
        tags: &["5g", "ios", "premium"],
        featured: true,
    },
    Seed {
        id: 2,
        name: "Samsung Galaxy S24 Ultra",
        slug: "samsung-galaxy-s24-ultra",
        description: "Smartphone com S Pen integrada, câmera de 200MP e tela de 6,8 polegadas.",
        price: dec!(7499.00),
        original_price: Some(dec!(8999.00)),
        brand: "Samsung",
        category: "Smartphones",
        rating: 4.7,
        review_count: 982,
        stock: 22,
        tags: &["5g", "android", "premium"],
        featured: true,
    },
    Seed {
        id: 3,
        name: "Xiaomi Redmi Note 13",
        slug: "xiaomi-redmi-note-13",
        description: "Smartphone com tela AMOLED de 120Hz e bateria de 5000mAh.",
        price: dec!(1299.90),
        original_price: Some(dec!(1599.90)),
        brand: "Xiaomi",
        category: "Smartphones",
        rating: 4.5,
        review_count: 2310,
        stock: 48,
        tags: &["android", "custo-benefício"],
        featured: false,
    },
    Seed {
        id: 4,
        name: "MacBook Air M3 13\"",
        slug: "macbook-air-m3-13",
        description: "Notebook ultrafino com chip M3, 8GB de memória e SSD de 256GB.",
        price: dec!(10499.00),
        original_price: None,
        brand: "Apple",
        category: "Notebooks",
        rating: 4.9,
        review_count: 534,
        stock: 8,
        tags: &["macos", "ultrafino", "premium"],
        featured: true,
    },
    Seed {
        id: 5,
        name: "Dell Inspiron 15",
        slug: "dell-inspiron-15",
        description: "Notebook com processador Intel Core i7, 16GB de RAM e SSD de 512GB.",
        price: dec!(4599.00),
        original_price: Some(dec!(5299.00)),
        brand: "Dell",
        category: "Notebooks",
        rating: 4.4,
        review_count: 418,
        stock: 12,
        tags: &["windows", "trabalho"],
        featured: false,
    },
    Seed {
        id: 6,
        name: "Notebook Gamer Lenovo LOQ",
        slug: "notebook-gamer-lenovo-loq",
        description: "Notebook gamer com RTX 4050, tela de 144Hz e processador Intel Core i5.",
        price: dec!(5799.00),
        original_price: Some(dec!(6499.00)),
        brand: "Lenovo",
        category: "Notebooks",
        rating: 4.6,
        review_count: 301,
        stock: 0,
        tags: &["gamer", "rtx", "windows"],
        featured: false,
    },
    Seed {
        id: 7,
        name: "Fone JBL Tune 520BT",
        slug: "fone-jbl-tune-520bt",
        description: "Fone de ouvido sem fio com até 57 horas de bateria e som JBL Pure Bass.",
        price: dec!(249.90),
        original_price: Some(dec!(349.90)),
        brand: "JBL",
        category: "Áudio",
        rating: 4.6,
        review_count: 3120,
        stock: 85,
        tags: &["bluetooth", "sem fio"],
        featured: false,
    },
    Seed {
        id: 8,
        name: "AirPods Pro (2ª geração)",
        slug: "airpods-pro-2",
        description: "Fones com cancelamento ativo de ruído e estojo de recarga USB-C.",
        price: dec!(1899.00),
        original_price: Some(dec!(2299.00)),
        brand: "Apple",
        category: "Áudio",
        rating: 4.8,
        review_count: 1876,
        stock: 30,
        tags: &["bluetooth", "cancelamento de ruído", "sem fio"],
        featured: true,
    },
    Seed {
        id: 9,
        name: "Caixa de Som JBL Flip 6",
        slug: "caixa-de-som-jbl-flip-6",
        description: "Caixa de som portátil à prova d'água com graves potentes.",
        price: dec!(699.00),
        original_price: None,
        brand: "JBL",
        category: "Áudio",
        rating: 4.7,
        review_count: 1540,
        stock: 40,
        tags: &["bluetooth", "portátil", "à prova d'água"],
        featured: false,
    },
    Seed {
        id: 10,
        name: "Apple Watch Series 9",
        slug: "apple-watch-series-9",
        description: "Smartwatch com sensor de oxigênio no sangue e tela Always-On.",
        price: dec!(3999.00),
        original_price: Some(dec!(4499.00)),
        brand: "Apple",
        category: "Smartwatches",
        rating: 4.7,
        review_count: 702,
        stock: 18,
        tags: &["saúde", "fitness"],
        featured: false,
    },
    Seed {
        id: 11,
        name: "Samsung Galaxy Watch6",
        slug: "samsung-galaxy-watch6",
        description: "Smartwatch com monitoramento de sono e composição corporal.",
        price: dec!(1699.00),
        original_price: Some(dec!(2199.00)),
        brand: "Samsung",
        category: "Smartwatches",
        rating: 4.5,
        review_count: 655,
        stock: 25,
        tags: &["saúde", "fitness", "android"],
        featured: false,
    },
    Seed {
        id: 12,
        name: "Smart TV LG OLED 55\" 4K",
        slug: "smart-tv-lg-oled-55-4k",
        description: "Smart TV OLED com processador α9, Dolby Vision e webOS.",
        price: dec!(5499.00),
        original_price: Some(dec!(6999.00)),
        brand: "LG",
        category: "TVs",
        rating: 4.8,
        review_count: 890,
        stock: 6,
        tags: &["4k", "oled", "smart tv"],
        featured: true,
    },
    Seed {
        id: 13,
        name: "Console PlayStation 5 Slim",
        slug: "console-playstation-5-slim",
        description: "Console com SSD ultrarrápido, controle DualSense e leitor de disco.",
        price: dec!(3799.00),
        original_price: Some(dec!(4199.00)),
        brand: "Sony",
        category: "Games",
        rating: 4.9,
        review_count: 2780,
        stock: 10,
        tags: &["console", "4k", "gamer"],
        featured: true,
    },
    Seed {
        id: 14,
        name: "Mouse Gamer Logitech G502 HERO",
        slug: "mouse-gamer-logitech-g502-hero",
        description: "Mouse com sensor HERO 25K, 11 botões programáveis e pesos ajustáveis.",
        price: dec!(299.90),
        original_price: Some(dec!(399.90)),
        brand: "Logitech",
        category: "Acessórios",
        rating: 4.7,
        review_count: 4210,
        stock: 60,
        tags: &["gamer", "rgb", "usb"],
        featured: false,
    },
    Seed {
        id: 15,
        name: "Carregador Anker 65W USB-C",
        slug: "carregador-anker-65w-usb-c",
        description: "Carregador compacto GaN com duas portas USB-C e uma USB-A.",
        price: dec!(279.00),
        original_price: None,
        brand: "Anker",
        category: "Acessórios",
        rating: 4.6,
        review_count: 980,
        stock: 120,
        tags: &["usb-c", "carregamento rápido"],
        featured: false,
    },
    Seed {
        id: 16,
        name: "iPad Air M2 11\"",
        slug: "ipad-air-m2-11",
        description: "Tablet com chip M2, tela Liquid Retina e suporte ao Apple Pencil Pro.",
        price: dec!(6299.00),
        original_price: Some(dec!(6999.00)),
        brand: "Apple",
        category: "Tablets",
        rating: 4.8,
        review_count: 412,
        stock: 14,
        tags: &["ipados", "premium"],
        featured: false,
    },
    Seed {
        id: 17,
        name: "Samsung Galaxy Tab S9 FE",
        slug: "samsung-galaxy-tab-s9-fe",
        description: "Tablet com S Pen inclusa, tela de 10,9 polegadas e resistência à água.",
        price: dec!(2499.00),
        original_price: Some(dec!(2999.00)),
        brand: "Samsung",
        category: "Tablets",
        rating: 4.5,
        review_count: 367,
        stock: 20,
        tags: &["android", "s pen"],
        featured: false,
    },
];
