use serde::{Deserialize, Serialize};

pub type CategoryId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Money coming in (salary, gifts received)
    Income,
    /// Money going out (rent, groceries, eating out)
    Expense,
    /// Credit card and loan movements
    Credit,
    /// Money set aside
    Savings,
}

impl CategoryType {
    pub const ALL: [CategoryType; 4] = [
        CategoryType::Income,
        CategoryType::Expense,
        CategoryType::Credit,
        CategoryType::Savings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
            CategoryType::Credit => "credit",
            CategoryType::Savings => "savings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(CategoryType::Income),
            "expense" => Some(CategoryType::Expense),
            "credit" => Some(CategoryType::Credit),
            "savings" | "saving" => Some(CategoryType::Savings),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub description: String,
    pub category_type: CategoryType,
}

impl Category {
    pub fn new(id: CategoryId, description: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id,
            description: description.into(),
            category_type,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Categories seeded into every new ledger, in id order starting at 1.
pub const DEFAULT_CATEGORIES: [(&str, CategoryType); 16] = [
    ("Utilities", CategoryType::Expense),
    ("Rent", CategoryType::Expense),
    ("Food", CategoryType::Expense),
    ("Entertainment", CategoryType::Expense),
    ("Education", CategoryType::Expense),
    ("Miscellaneous", CategoryType::Expense),
    ("Medical Expenses", CategoryType::Expense),
    ("Vacation", CategoryType::Expense),
    ("Credit Card", CategoryType::Credit),
    ("Clothes", CategoryType::Expense),
    ("Gifts", CategoryType::Expense),
    ("Insurance", CategoryType::Expense),
    ("Transportation", CategoryType::Expense),
    ("Eating Out", CategoryType::Expense),
    ("Savings", CategoryType::Savings),
    ("Income", CategoryType::Income),
];
