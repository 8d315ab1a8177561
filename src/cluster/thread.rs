// file: src/cluster/thread.rs
// description: a cluster of near duplicate articles and its derived attributes

use crate::models::{Category, ClassifiedDocument, Language, ThreadEntry};

/// The parts of a document a thread needs, copied out of the working set.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMember {
    pub name: String,
    pub title: String,
    pub category: Category,
    pub weight: f32,
    pub fetch_time: u64,
}

impl From<&ClassifiedDocument> for ThreadMember {
    fn from(doc: &ClassifiedDocument) -> Self {
        Self {
            name: doc.name.clone(),
            title: doc.title().to_string(),
            category: doc.category_or_undefined(),
            weight: doc.weight_or_zero(),
            fetch_time: doc.fetch_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    language: Language,
    members: Vec<ThreadMember>,
    category: Category,
    weight: f32,
    time: u64,
}

impl Cluster {
    /// Returns `None` for an empty member list.
    pub fn new(language: Language, mut members: Vec<ThreadMember>) -> Option<Self> {
        if members.is_empty() {
            return None;
        }

        members.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        let category = dominant_category(&members);
        let total: f32 = members.iter().map(|m| m.weight).sum();
        let weight = total * ((members.len() + 1) as f32).sqrt();
        let time = members.iter().map(|m| m.fetch_time).max().unwrap_or(0);

        Some(Self {
            language,
            members,
            category,
            weight,
            time,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Most recent fetch time among the members.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn title(&self) -> &str {
        &self.members[0].title
    }

    /// Members ranked by descending weight.
    pub fn members(&self) -> &[ThreadMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn article_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    pub fn to_entry(&self) -> ThreadEntry {
        ThreadEntry {
            title: self.title().to_string(),
            category: self.category.name().to_string(),
            articles: self.article_names(),
        }
    }
}

/// Majority among slotted categories; ties go to the earlier slot.
fn dominant_category(members: &[ThreadMember]) -> Category {
    let mut votes = [0usize; Category::SLOTS.len()];
    for member in members {
        if let Some(slot) = member.category.slot() {
            votes[slot] += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (slot, count) in votes.iter().enumerate() {
        if *count > 0 && best.is_none_or(|(_, top)| *count > top) {
            best = Some((slot, *count));
        }
    }

    best.map(|(slot, _)| Category::SLOTS[slot])
        .unwrap_or(Category::Undefined)
}
