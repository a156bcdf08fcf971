//! Intent classification — does this query need retrieval at all?
//!
//! Pure keyword classification over the query text. Greetings and questions
//! about the system itself get a canned reply; anything that touches the EV
//! domain must retrieve. When nothing matches we default to domain: a
//! wasted lookup beats a wrong bypass.

use super::types::QueryCategory;

/// Pure greetings, matched against the whole (trimmed) query.
const GREETINGS: &[&str] = &[
    "你好", "您好", "hi", "hello", "hey", "早上好", "下午好", "晚上好", "在吗", "嗨",
];

/// Markers for questions about the system itself.
const META_MARKERS: &[&str] = &[
    "你能做什么",
    "你会什么",
    "如何使用",
    "怎么用",
    "这个系统",
    "什么功能",
    "使用说明",
    "what can you do",
    "how do i use",
    "how to use",
];

/// Keywords that force retrieval no matter what else matched.
const DOMAIN_KEYWORDS: &[&str] = &[
    "用户", "车型", "评价", "对比", "分析", "画像", "需求", "痛点", "竞品", "prd",
    "续航", "内饰", "座舱", "价格", "参数", "model", "特斯拉", "比亚迪", "理想",
    "蔚来", "小鹏", "问界", "小米", "极氪",
];

/// Canned reply for greetings.
pub const GREETING_RESPONSE: &str = "你好！我是电动汽车产品智能助手。\n\n\
我可以帮您：\n\
- 分析用户洞察和需求\n\
- 进行竞品对比分析\n\
- 撰写产品需求文档\n\n\
请告诉我您想了解什么？";

/// Canned reply for meta questions about the system.
pub const META_RESPONSE: &str = "我是电动汽车产品智能助手，基于真实用户评价和车型参数回答问题。\n\
您可以询问用户画像、车型对比或让我起草产品文档。请具体告诉我您想了解什么？";

/// Safe reply for input we cannot parse at all.
pub const MALFORMED_RESPONSE: &str =
    "抱歉，我没有理解您的问题。请换一种方式描述您想了解的内容。";

/// Classify the query into a coarse category.
///
/// `has_entities` is whether vocabulary extraction already found something;
/// an entity mention always makes the query a domain question.
pub fn classify(text: &str, has_entities: bool) -> QueryCategory {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return QueryCategory::Malformed;
    }

    let lowered = trimmed.to_lowercase();

    if has_entities || DOMAIN_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return QueryCategory::Domain;
    }

    if GREETINGS.iter().any(|g| {
        // Whole-query match, tolerating trailing punctuation ("你好!", "hi~").
        let stripped: String = lowered
            .chars()
            .filter(|c| !c.is_ascii_punctuation() && !"！？。，～".contains(*c))
            .collect();
        stripped == *g
    }) {
        return QueryCategory::Greeting;
    }

    if META_MARKERS.iter().any(|m| lowered.contains(m)) {
        return QueryCategory::Meta;
    }

    // Unclassifiable input still gets the safe default: retrieve.
    QueryCategory::Domain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_greeting_bypasses_retrieval() {
        assert_eq!(classify("你好", false), QueryCategory::Greeting);
        assert_eq!(classify("Hi!", false), QueryCategory::Greeting);
        assert_eq!(classify("早上好～", false), QueryCategory::Greeting);
    }

    #[test]
    fn meta_question_bypasses_retrieval() {
        assert_eq!(classify("你能做什么？", false), QueryCategory::Meta);
        assert_eq!(classify("What can you do?", false), QueryCategory::Meta);
    }

    #[test]
    fn domain_keyword_forces_domain() {
        assert_eq!(classify("有哪些用户类型", false), QueryCategory::Domain);
        // Even a greeting-looking query with a domain keyword retrieves.
        assert_eq!(classify("你好，Model Y 怎么样", false), QueryCategory::Domain);
    }

    #[test]
    fn entity_mention_forces_domain() {
        assert_eq!(classify("它怎么样", true), QueryCategory::Domain);
    }

    #[test]
    fn empty_input_is_malformed() {
        assert_eq!(classify("   ", false), QueryCategory::Malformed);
    }

    #[test]
    fn unclassifiable_defaults_to_domain() {
        assert_eq!(classify("嗯嗯嗯那个啥", false), QueryCategory::Domain);
    }
}
