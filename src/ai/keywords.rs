/// Controlled vocabulary the analyze step selects article keywords from.
/// The backend is instructed to pick only from this list.
pub const KEYWORDS: &[&str] = &[
    "technology",
    "programming",
    "web development",
    "artificial intelligence",
    "machine learning",
    "data science",
    "cybersecurity",
    "cloud computing",
    "mobile apps",
    "software engineering",
    "open source",
    "productivity",
    "self improvement",
    "career",
    "remote work",
    "entrepreneurship",
    "startups",
    "marketing",
    "finance",
    "investing",
    "health",
    "fitness",
    "nutrition",
    "mental health",
    "travel",
    "food",
    "cooking",
    "lifestyle",
    "fashion",
    "photography",
    "art",
    "design",
    "music",
    "books",
    "writing",
    "education",
    "science",
    "environment",
    "sustainability",
    "renewable energy",
    "politics",
    "culture",
    "history",
    "philosophy",
    "psychology",
    "relationships",
    "parenting",
    "sports",
    "gaming",
    "gardening",
];
