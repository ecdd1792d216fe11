//! Example whispers shown when neither the remote store nor the cache has data.

use chrono::{Duration, Utc};

use crate::models::{Mood, Post, PostId, ANONYMOUS_AUTHOR};

/// The three fixed seed posts, newest first, timestamped relative to now.
pub fn seed_posts() -> Vec<Post> {
    let now = Utc::now();
    let tags = |list: &[&str]| list.iter().map(|t| t.to_string()).collect::<Vec<_>>();

    vec![
        Post {
            id: PostId::new("1"),
            content: "بدأت رحلة التأمل منذ شهر وأشعر بتحسن كبير في مزاجي وسلامي الداخلي. التأمل لمدة 10 دقائق يومياً غيّر حياتي حقاً 🌱✨".to_string(),
            mood: Mood::Emerald,
            is_anonymous: false,
            author: "سارة النور".to_string(),
            hashtags: tags(&["#التأمل", "#السلام_النفسي"]),
            likes_count: 23,
            is_liked: false,
            created_at: now - Duration::minutes(30),
        },
        Post {
            id: PostId::new("2"),
            content: "أحياناً نحتاج فقط لشخص يسمعنا دون إصدار أحكام. شكراً لهذا المجتمع الرائع على كونه مساحة آمنة للجميع 💙🤗".to_string(),
            mood: Mood::Ocean,
            is_anonymous: true,
            author: ANONYMOUS_AUTHOR.to_string(),
            hashtags: tags(&["#الدعم_المجتمعي", "#الأمان"]),
            likes_count: 67,
            is_liked: true,
            created_at: now - Duration::hours(1),
        },
        Post {
            id: PostId::new("3"),
            content: "اليوم تذكرت أن كل خطوة صغيرة نحو الأفضل تستحق الاحتفال. لا تستهين بالتقدم البسيط 🌈💪".to_string(),
            mood: Mood::Amber,
            is_anonymous: false,
            author: "أحمد الأمل".to_string(),
            hashtags: tags(&["#التقدير_الذاتي", "#الامتنان"]),
            likes_count: 45,
            is_liked: false,
            created_at: now - Duration::hours(2),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_match_the_fixed_examples() {
        let seeds = seed_posts();
        let likes: Vec<u64> = seeds.iter().map(|p| p.likes_count).collect();
        assert_eq!(likes, vec![23, 67, 45]);
        assert!(seeds[1].is_liked);
        assert_eq!(seeds[1].author, ANONYMOUS_AUTHOR);
        assert!(seeds.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }
}
