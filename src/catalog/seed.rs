//! Default catalog used when no snapshot exists yet.

use crate::catalog::Catalog;
use crate::domain::aggregates::{
    AnnouncementBar, Banner, BrandColors, Category, MenuItem, MenuItemType, Page, Product, ReferenceEntity, Status, StoreConfig, TextPosition,
};
use crate::domain::value_objects::{HexColor, Slug};

fn reference(id: &str, name: &str) -> ReferenceEntity {
    ReferenceEntity { id: id.into(), name: name.into() }
}

fn category(id: &str, name: &str) -> Category {
    Category { id: id.into(), name: name.into(), parent_id: None }
}

fn status(id: &str, name: &str, inactive: bool) -> Status {
    Status { id: id.into(), name: name.into(), inactive }
}

#[allow(clippy::too_many_arguments)]
fn product(id: &str, name: &str, category: &str, price: f64, status_id: &str, condition_id: &str, brand_id: &str, supplier_id: &str, cost_usd: f64) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        price: Some(price),
        image_url: format!("https://picsum.photos/seed/product-{id}/600/600"),
        status_id: status_id.into(),
        condition_id: Some(condition_id.into()),
        brand_id: Some(brand_id.into()),
        supplier_id: Some(supplier_id.into()),
        cost_usd: Some(cost_usd),
        ..Product::default()
    }
}

fn color(hex: &str) -> HexColor {
    HexColor::new(hex).unwrap_or_else(|_| unreachable!("seed colors are valid"))
}

pub fn seed_catalog() -> Catalog {
    let mut products = vec![
        product("10", "Iphone 11 128GB", "cat3", 1695.0, "status1", "cond3", "brand1", "sup2", 250.0),
        product("11", "Apple iPhone 12 128GB 6.1\" (Bateria Trocada)", "cat3", 1779.75, "status1", "cond3", "brand1", "sup2", 280.0),
        product("12", "Apple iPhone 12 128GB 6.1", "cat3", 1948.5, "status1", "cond3", "brand1", "sup2", 300.0),
        product("13", "iPhone 13 128GB (Bateria Trocada)", "cat3", 2288.25, "status1", "cond3", "brand1", "sup1", 350.0),
        product("14", "Apple iPhone 13 128GB 6.1\"", "cat3", 2448.6, "status1", "cond3", "brand1", "sup1", 380.0),
        product("15", "iPhone 14 Pro Max 128GB A Esim Tela Trocada", "cat3", 3282.65, "status1", "cond3", "brand1", "sup1", 500.0),
        product("16", "iPhone 14 Pro Max 256GB", "cat3", 4587.8, "status1", "cond3", "brand1", "sup1", 700.0),
        product("17", "iPhone 15 Pro Max 256GB", "cat3", 5262.98, "status2", "cond3", "brand1", "sup1", 850.0),
        product("18", "iPhone 15 Pro Max Lacrado", "cat2", 8999.9, "status1", "cond1", "brand1", "sup1", 1300.0),
        product("19", "Xiaomi Redmi Note 13", "cat4", 1850.0, "status3", "cond1", "brand3", "sup3", 250.0),
    ];
    let first = &mut products[0];
    first.reference = Some("AP11SW128".into());
    first.details = Some("Bateria 85%, Tela Original".into());
    first.markup = Some(25.5);
    first.cost_brl = Some(1312.5);
    first.profit_brl = Some(382.5);
    products[1].details = Some("Bateria Nova (100%), pequenas marcas de uso".into());
    products[3].details = Some("Bateria Nova (100%)".into());
    products[4].details = Some("Bateria 92%, sem marcas de uso".into());
    products[8].description = Some("O mais novo lançamento da Apple com chip A17 Bionic.".into());

    Catalog {
        products,
        categories: vec![
            category("cat1", "Smartphones em Estoque"),
            category("cat2", "iPhone Lacrado"),
            category("cat3", "iPhone Swap"),
            category("cat4", "Xiaomi e Realme"),
            category("cat5", "Celulares Usados"),
        ],
        brands: vec![reference("brand1", "Apple"), reference("brand2", "Samsung"), reference("brand3", "Xiaomi"), reference("brand4", "Realme")],
        conditions: vec![reference("cond1", "Lacrado"), reference("cond2", "Seminovo"), reference("cond3", "Swap"), reference("cond4", "Usado")],
        statuses: vec![status("status1", "Estoque disponível", false), status("status2", "Por encomenda", false), status("status3", "Inativo", true)],
        suppliers: vec![reference("sup1", "Fornecedor Apple BR"), reference("sup2", "Importados XYZ"), reference("sup3", "Distribuidor Local")],
        banners: vec![
            Banner {
                id: "banner1".into(),
                image_url: "https://picsum.photos/seed/promo-banner/1200/400".into(),
                alt_text: "Promoções da Semana".into(),
                link_url: Some("#".into()),
                title: "Ofertas da Semana".into(),
                subtitle: "Descontos de até 30% em modelos selecionados".into(),
                text_color: Some(color("#FFFFFF")),
                text_position: TextPosition::CenterCenter,
            },
            Banner {
                id: "banner2".into(),
                image_url: "https://picsum.photos/seed/new-iphones-banner/1200/400".into(),
                alt_text: "Novidades e Lançamentos".into(),
                link_url: None,
                title: "Novos iPhones Chegaram!".into(),
                subtitle: "Confira os últimos lançamentos da Apple".into(),
                text_color: Some(color("#FFFFFF")),
                text_position: TextPosition::BottomLeft,
            },
        ],
        pages: vec![Page {
            id: "page_about_us".into(),
            title: "Sobre Nós".into(),
            slug: Slug::from_title("Sobre Nós").unwrap_or_else(|_| unreachable!("seed slug is valid")),
            content: "<h2>Nossa História</h2><p>Especialistas em smartphones, informática e eletrônicos em geral.</p>".into(),
            is_visible: true,
        }],
        config: StoreConfig {
            store_name: "GM Celular".into(),
            slogan: "Tudo em um só lugar! Cobrimos qualquer oferta.".into(),
            logo_url: "/assets/logo.png".into(),
            address: "Av. Pres. Castelo Branco, 123 – Centro – Virgem da Lapa – MG".into(),
            whatsapp_number: "33988451996".into(),
            instagram_handle: "gmcelular33".into(),
            colors: BrandColors { primary: color("#007BFF"), secondary: color("#0A192F") },
            font: "Inter".into(),
            announcement_bar: AnnouncementBar { text: "Assistência Técnica Especializada e Acessórios".into(), enabled: true },
            header_menu: vec![
                MenuItem { id: "menu1".into(), label: "Página Inicial".into(), kind: MenuItemType::Home, value: "/".into() },
                MenuItem { id: "menu2".into(), label: "Sobre Nós".into(), kind: MenuItemType::Page, value: "page_about_us".into() },
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_seed_is_consistent() {
        let catalog = seed_catalog();
        assert_eq!(catalog.inactive_status_id(), Some("status3"));
        assert_eq!(catalog.pages[0].slug.as_str(), "sobre-nos");
        assert!(catalog.config.validate_menu(&catalog.pages).is_ok());
        for p in &catalog.products {
            assert!(catalog.categories.iter().any(|c| c.id == p.category), "{}", p.id);
            assert!(catalog.statuses.iter().any(|s| s.id == p.status_id), "{}", p.id);
        }
    }
}
