//! # kh-ui
//!
//! Askama templates for the board and the HTML `Presenter` built on them.

pub mod filters;
mod presenter;

pub use presenter::HtmlPresenter;

use askama::Template;
use kh_core::models::{Mood, Post};

/// A mood offered by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Composer choices, in display order.
pub fn mood_options() -> Vec<MoodOption> {
    Mood::known()
        .iter()
        .map(|mood| MoodOption {
            value: static_tag(mood),
            label: known_label(mood),
        })
        .collect()
}

fn static_tag(mood: &Mood) -> &'static str {
    match mood {
        Mood::Emerald => "emerald",
        Mood::Ocean => "ocean",
        Mood::Amber => "amber",
        Mood::Rose => "rose",
        Mood::Violet => "violet",
        Mood::Sunset => "sunset",
        Mood::Other(_) => "emerald",
    }
}

/// Display name of a mood; unknown tags are shown as stored.
pub fn mood_label(mood: &Mood) -> &str {
    match mood {
        Mood::Other(tag) => tag,
        known => known_label(known),
    }
}

fn known_label(mood: &Mood) -> &'static str {
    match mood {
        Mood::Emerald => "هادئ",
        Mood::Ocean => "متأمل",
        Mood::Amber => "متفائل",
        Mood::Rose => "محب",
        Mood::Violet => "حالم",
        Mood::Sunset => "حنين",
        Mood::Other(_) => "",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            NoticeKind::Success => "notice-success",
            NoticeKind::Error => "notice-error",
            NoticeKind::Warning => "notice-warning",
            NoticeKind::Info => "notice-info",
        }
    }
}

/// Banner shown above the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn posted() -> Self {
        Self::new(NoticeKind::Success, "تم نشر همستك بنجاح! 🎉")
    }

    pub fn welcome() -> Self {
        Self::new(NoticeKind::Info, "مرحباً بك في خواطر - همسات الروح 🌸")
    }

    pub fn publish_failed() -> Self {
        Self::new(NoticeKind::Error, "خطأ في النشر، حاول مرة أخرى")
    }
}

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub title: &'a str,
    pub notice: Option<&'a Notice>,
    /// Pre-rendered timeline section
    pub list_html: &'a str,
    pub max_post_length: usize,
    pub moods: &'a [MoodOption],
    /// Composer text kept after a rejected submission
    pub draft: &'a str,
}

#[derive(Template)]
#[template(path = "post_list.html")]
pub struct PostListTemplate<'a> {
    pub posts: &'a [Post],
}

#[derive(Template)]
#[template(path = "like_button.html")]
pub struct LikeButtonTemplate<'a> {
    pub post_id: &'a str,
    pub is_liked: bool,
    pub likes_count: u64,
}

#[derive(Template)]
#[template(path = "loading.html")]
pub struct LoadingTemplate;
