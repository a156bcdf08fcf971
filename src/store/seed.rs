//! Demo corpus for the reference stores.
//!
//! A small but realistic slice of the EV landscape: four brands, their
//! flagship series, personas with the dimensions they care about, review
//! excerpts wired into both stores. Enough to exercise every routing path
//! from the CLI without external services.

use super::memory::MemoryVectorDriver;
use super::sqlite::{NodeKind, SqliteGraphDriver};
use crate::adapter::{DriverError, RelationshipType};
use crate::vocab::{EntityKind, StaticVocabulary};

struct SeedReview {
    id: &'static str,
    series: &'static str,
    brand: &'static str,
    dimension: &'static str,
    sentiment: &'static str,
    text: &'static str,
}

const REVIEWS: &[SeedReview] = &[
    SeedReview {
        id: "review-my-001",
        series: "Model Y",
        brand: "特斯拉",
        dimension: "内饰",
        sentiment: "negative",
        text: "Model Y 的内饰太简陋了，中控就一块大屏，用料一般，跟同价位国产车没法比",
    },
    SeedReview {
        id: "review-my-002",
        series: "Model Y",
        brand: "特斯拉",
        dimension: "续航",
        sentiment: "positive",
        text: "Model Y 长续航版实际高速续航能跑 520 公里左右，冬天打八折，整体够用",
    },
    SeedReview {
        id: "review-my-003",
        series: "Model Y",
        brand: "特斯拉",
        dimension: "智能化",
        sentiment: "positive",
        text: "特斯拉的辅助驾驶在高速上很稳，变道超车干脆利落",
    },
    SeedReview {
        id: "review-l7-001",
        series: "理想 L7",
        brand: "理想汽车",
        dimension: "舒适性",
        sentiment: "positive",
        text: "理想 L7 冰箱彩电大沙发名不虚传，二排老板座家人都说舒服",
    },
    SeedReview {
        id: "review-l7-002",
        series: "理想 L7",
        brand: "理想汽车",
        dimension: "续航",
        sentiment: "negative",
        text: "理想 L7 纯电续航短，市区通勤还行，跑长途基本靠增程器烧油",
    },
    SeedReview {
        id: "review-m5-001",
        series: "AITO 问界 M5",
        brand: "AITO 问界",
        dimension: "智能化",
        sentiment: "positive",
        text: "问界 M5 的鸿蒙车机流畅度是第一梯队，语音助手响应快",
    },
    SeedReview {
        id: "review-m5-002",
        series: "AITO 问界 M5",
        brand: "AITO 问界",
        dimension: "操控",
        sentiment: "neutral",
        text: "问界 M5 底盘调校偏舒适，过弯侧倾明显，但日常开没问题",
    },
    SeedReview {
        id: "review-seal-001",
        series: "海豹",
        brand: "比亚迪",
        dimension: "操控",
        sentiment: "positive",
        text: "比亚迪海豹的 CTB 车身很整，过弯信心足，是同级里最好开的",
    },
    SeedReview {
        id: "review-seal-002",
        series: "海豹",
        brand: "比亚迪",
        dimension: "充电",
        sentiment: "negative",
        text: "海豹充电速度一般，快充峰值功率上不去，服务区排队时间更久",
    },
];

struct SeedPersona {
    name: &'static str,
    priorities: &'static [&'static str],
}

const PERSONAS: &[SeedPersona] = &[
    SeedPersona {
        name: "科技尝鲜族",
        priorities: &["智能化", "操控"],
    },
    SeedPersona {
        name: "家庭用户",
        priorities: &["舒适性", "续航"],
    },
    SeedPersona {
        name: "通勤实用派",
        priorities: &["续航", "充电"],
    },
];

const DIMENSIONS: &[&str] = &["内饰", "续航", "智能化", "舒适性", "操控", "充电"];

/// (brand, series list) spine of the demo graph.
const BRANDS: &[(&str, &[&str])] = &[
    ("特斯拉", &["Model Y", "Model 3"]),
    ("理想汽车", &["理想 L7", "理想 L9"]),
    ("AITO 问界", &["AITO 问界 M5", "AITO 问界 M7"]),
    ("比亚迪", &["海豹", "汉"]),
];

/// Populate the graph store with the demo spine, personas, and reviews.
pub fn seed_graph(driver: &SqliteGraphDriver) -> Result<(), DriverError> {
    for dimension in DIMENSIONS {
        driver.add_entity(NodeKind::Dimension, dimension, &serde_json::json!({}))?;
    }

    for (brand, series_list) in BRANDS {
        let brand_id =
            driver.add_entity(NodeKind::Brand, brand, &serde_json::json!({}))?;
        for series in *series_list {
            let series_id =
                driver.add_entity(NodeKind::Series, series, &serde_json::json!({}))?;
            driver.add_relationship(
                &series_id,
                &brand_id,
                RelationshipType::BelongsToBrand,
                &serde_json::json!({}),
            )?;
        }
    }

    for persona in PERSONAS {
        let persona_id =
            driver.add_entity(NodeKind::Persona, persona.name, &serde_json::json!({}))?;
        for dimension in persona.priorities {
            driver.add_relationship(
                &persona_id,
                &format!("dimension:{dimension}"),
                RelationshipType::Prioritizes,
                &serde_json::json!({}),
            )?;
        }
    }

    for review in REVIEWS {
        let review_id = driver.add_entity(
            NodeKind::Review,
            review.id,
            &serde_json::json!({
                "text": review.text,
                "sentiment": review.sentiment,
            }),
        )?;
        driver.add_relationship(
            &review_id,
            &format!("series:{}", review.series),
            RelationshipType::Evaluates,
            &serde_json::json!({}),
        )?;
        driver.add_relationship(
            &review_id,
            &format!("dimension:{}", review.dimension),
            RelationshipType::Mentions,
            &serde_json::json!({"sentiment": review.sentiment}),
        )?;
    }

    Ok(())
}

/// Populate the vector store with the review excerpts.
pub fn seed_vectors(driver: &MemoryVectorDriver) -> Result<(), DriverError> {
    for review in REVIEWS {
        driver.add_document(
            review.id,
            review.text,
            serde_json::json!({
                "series": review.series,
                "brand": review.brand,
                "dimension": review.dimension,
                "sentiment": review.sentiment,
            }),
        )?;
    }
    Ok(())
}

/// The vocabulary matching the demo corpus, aliases included.
pub fn demo_vocabulary() -> StaticVocabulary {
    StaticVocabulary::new()
        .with_entity(EntityKind::Brand, "特斯拉", ["Tesla", "tesla"])
        .with_entity(EntityKind::Brand, "理想汽车", ["理想"])
        .with_entity(EntityKind::Brand, "AITO 问界", ["问界", "AITO"])
        .with_entity(EntityKind::Brand, "比亚迪", ["BYD", "byd"])
        .with_entity(EntityKind::Brand, "小米汽车", ["小米", "Xiaomi", "xiaomi"])
        .with_entity(EntityKind::Series, "Model Y", ["modely", "焕新 Model Y"])
        .with_entity(EntityKind::Series, "Model 3", ["model3"])
        .with_entity(EntityKind::Series, "理想 L7", ["理想L7", "L7"])
        .with_entity(EntityKind::Series, "理想 L9", ["理想L9", "L9"])
        .with_entity(EntityKind::Series, "AITO 问界 M5", ["问界M5", "问界 M5", "M5"])
        .with_entity(EntityKind::Series, "AITO 问界 M7", ["问界M7", "问界 M7", "M7"])
        .with_entity(EntityKind::Series, "海豹", ["比亚迪海豹"])
        .with_entity(EntityKind::Series, "汉", ["比亚迪汉"])
        .with_entity(EntityKind::Persona, "科技尝鲜族", Vec::<String>::new())
        .with_entity(EntityKind::Persona, "家庭用户", Vec::<String>::new())
        .with_entity(EntityKind::Persona, "通勤实用派", Vec::<String>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{GraphDriver, GraphQuery};
    use crate::analyzer::ResolvedEntity;
    use crate::vocab::EntityVocabulary;

    #[tokio::test]
    async fn seeded_graph_answers_series_queries() {
        let driver = SqliteGraphDriver::open_in_memory().unwrap();
        seed_graph(&driver).unwrap();

        let rows = driver
            .fetch(&GraphQuery {
                entity_filter: vec![ResolvedEntity::from_query(EntityKind::Series, "Model Y")],
                relationship_types: vec![RelationshipType::Evaluates],
                limit: 50,
            })
            .await
            .unwrap();

        assert!(rows.iter().any(|r| r.id == "series:Model Y"));
        assert!(rows.iter().any(|r| r.id.starts_with("review:review-my")));
    }

    #[test]
    fn seeded_vectors_cover_all_reviews() {
        let driver = MemoryVectorDriver::with_hash_embedder();
        seed_vectors(&driver).unwrap();
        assert_eq!(driver.len(), REVIEWS.len());
    }

    #[test]
    fn vocabulary_canonicalizes_demo_aliases() {
        let vocab = demo_vocabulary();
        let terms = vocab.terms();
        let alias = terms.iter().find(|t| t.term == "问界M5").unwrap();
        assert_eq!(alias.canonical, "AITO 问界 M5");
    }

    #[test]
    fn seeding_twice_is_idempotent() {
        let driver = SqliteGraphDriver::open_in_memory().unwrap();
        seed_graph(&driver).unwrap();
        seed_graph(&driver).unwrap();
    }
}
