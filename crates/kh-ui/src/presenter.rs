//! HTML implementation of the board `Presenter`.
//!
//! Keeps the latest rendering of the timeline and of every like button so
//! the HTTP layer can serve them without re-rendering.

use std::sync::{PoisonError, RwLock};

use askama::Template;
use dashmap::DashMap;
use kh_core::error::{AppError, Result};
use kh_core::models::{Post, PostId};
use kh_core::traits::Presenter;
use tracing::warn;

use crate::{
    mood_options, LikeButtonTemplate, LoadingTemplate, MoodOption, Notice, PageTemplate,
    PostListTemplate,
};

pub struct HtmlPresenter {
    title: String,
    max_post_length: usize,
    moods: Vec<MoodOption>,
    list_html: RwLock<String>,
    like_html: DashMap<PostId, String>,
}

impl HtmlPresenter {
    pub fn new(title: impl Into<String>, max_post_length: usize) -> Self {
        Self {
            title: title.into(),
            max_post_length,
            moods: mood_options(),
            list_html: RwLock::new(String::new()),
            like_html: DashMap::new(),
        }
    }

    /// The most recently rendered timeline section.
    pub fn list_html(&self) -> String {
        self.list_html
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently rendered like button of `post_id`.
    pub fn like_html(&self, post_id: &PostId) -> Option<String> {
        self.like_html.get(post_id).map(|html| html.value().clone())
    }

    /// Full page around the current timeline.
    pub fn render_page(&self, notice: Option<&Notice>, draft: &str) -> Result<String> {
        let list_html = self.list_html();
        PageTemplate {
            title: &self.title,
            notice,
            list_html: &list_html,
            max_post_length: self.max_post_length,
            moods: &self.moods,
            draft,
        }
        .render()
        .map_err(|e| AppError::Internal(format!("page template: {e}")))
    }

    fn store_list(&self, html: String) {
        *self
            .list_html
            .write()
            .unwrap_or_else(PoisonError::into_inner) = html;
    }
}

impl Presenter for HtmlPresenter {
    fn render_list(&self, posts: &[Post]) {
        match (PostListTemplate { posts }).render() {
            Ok(html) => {
                self.store_list(html);
                // Card renderings supersede older like fragments.
                self.like_html.clear();
                for post in posts {
                    self.render_like_state(&post.id, post.is_liked, post.likes_count);
                }
            }
            Err(err) => warn!(error = %err, "could not render timeline"),
        }
    }

    fn render_like_state(&self, post_id: &PostId, is_liked: bool, likes_count: u64) {
        let fragment = LikeButtonTemplate {
            post_id: post_id.as_str(),
            is_liked,
            likes_count,
        };
        match fragment.render() {
            Ok(html) => {
                self.like_html.insert(post_id.clone(), html);
            }
            Err(err) => warn!(error = %err, %post_id, "could not render like button"),
        }
    }

    fn render_loading(&self) {
        match LoadingTemplate.render() {
            Ok(html) => self.store_list(html),
            Err(err) => warn!(error = %err, "could not render loading state"),
        }
    }
}
