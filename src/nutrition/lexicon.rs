use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Grain,
    Protein,
    Vegetable,
    Fruit,
    Dairy,
    Other,
}

/// Local-language label paired with the term used for nutrient lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodTerm {
    pub local_name: &'static str,
    pub canonical_name: &'static str,
    pub default_portion_grams: f64,
    pub category: FoodCategory,
}

const fn term(
    local_name: &'static str,
    canonical_name: &'static str,
    default_portion_grams: f64,
    category: FoodCategory,
) -> FoodTerm {
    FoodTerm {
        local_name,
        canonical_name,
        default_portion_grams,
        category,
    }
}

use FoodCategory::*;

// Iteration order matters: description scanning appends matches in this order.
pub static LEXICON: &[FoodTerm] = &[
    term("米饭", "rice", 150.0, Grain),
    term("白米饭", "white rice", 150.0, Grain),
    term("面条", "noodles", 200.0, Grain),
    term("面包", "bread", 50.0, Grain),
    term("鸡蛋", "egg", 50.0, Protein),
    term("鸡肉", "chicken", 100.0, Protein),
    term("牛肉", "beef", 100.0, Protein),
    term("猪肉", "pork", 100.0, Protein),
    term("鱼", "fish", 120.0, Protein),
    term("虾", "shrimp", 100.0, Protein),
    term("豆腐", "tofu", 100.0, Protein),
    term("青菜", "vegetables", 150.0, Vegetable),
    term("西兰花", "broccoli", 150.0, Vegetable),
    term("番茄", "tomato", 150.0, Vegetable),
    term("黄瓜", "cucumber", 150.0, Vegetable),
    term("苹果", "apple", 150.0, Fruit),
    term("香蕉", "banana", 120.0, Fruit),
    term("橙子", "orange", 150.0, Fruit),
    term("牛奶", "milk", 250.0, Dairy),
    term("酸奶", "yogurt", 150.0, Dairy),
    term("咖啡", "coffee", 250.0, Other),
    term("茶", "tea", 250.0, Other),
    term("水饺", "dumplings", 200.0, Grain),
    term("包子", "steamed bun", 100.0, Grain),
    term("馒头", "steamed bread", 100.0, Grain),
    term("粥", "porridge", 250.0, Grain),
    term("汤", "soup", 250.0, Other),
    term("沙拉", "salad", 150.0, Vegetable),
    term("三明治", "sandwich", 150.0, Grain),
    term("汉堡", "hamburger", 200.0, Grain),
    term("披萨", "pizza", 150.0, Grain),
    term("意面", "pasta", 200.0, Grain),
    term("寿司", "sushi", 150.0, Grain),
];

lazy_static! {
    static ref BY_LOCAL: HashMap<&'static str, &'static FoodTerm> =
        LEXICON.iter().map(|t| (t.local_name, t)).collect();
    static ref BY_CANONICAL: HashMap<String, &'static FoodTerm> = {
        let mut m = HashMap::new();
        for t in LEXICON {
            // first entry wins when two local names share a canonical term
            m.entry(t.canonical_name.to_lowercase()).or_insert(t);
        }
        m
    };
}

pub fn by_local(name: &str) -> Option<&'static FoodTerm> {
    BY_LOCAL.get(name).copied()
}

/// Case-insensitive reverse lookup.
pub fn by_canonical(name: &str) -> Option<&'static FoodTerm> {
    BY_CANONICAL.get(&name.to_lowercase()).copied()
}

/// Label shown to the user: the local name when the term maps back to the lexicon.
pub fn display_name(canonical: &str) -> String {
    by_canonical(canonical)
        .map(|t| t.local_name.to_string())
        .unwrap_or_else(|| canonical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_and_canonical_lookups_agree() {
        let t = by_local("西兰花").unwrap();
        assert_eq!(t.canonical_name, "broccoli");
        assert_eq!(by_canonical("Broccoli").unwrap().local_name, "西兰花");
        assert!(by_local("broccoli").is_none());
    }

    #[test]
    fn display_name_falls_back_to_the_term() {
        assert_eq!(display_name("rice"), "米饭");
        assert_eq!(display_name("quinoa"), "quinoa");
    }

    #[test]
    fn canonical_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for t in LEXICON {
            assert!(seen.insert(t.canonical_name), "duplicate {}", t.canonical_name);
        }
    }
}
