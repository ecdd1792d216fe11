//! # Board Controller
//!
//! Top-level owner of the repository and the presenter. Front ends call the
//! three entry points here: load-and-render, create-post and toggle-like.

use std::sync::Arc;

use tracing::debug;

use crate::content::char_count;
use crate::error::{AppError, Result};
use crate::models::{LikeState, Mood, Post, PostId};
use crate::repository::PostRepository;
use crate::traits::Presenter;

/// Longest whisper accepted by the composer.
pub const DEFAULT_MAX_POST_LENGTH: usize = 280;

pub struct BoardController {
    repo: Arc<PostRepository>,
    presenter: Arc<dyn Presenter>,
    max_post_length: usize,
}

impl BoardController {
    /// Wires `presenter` to the repository's like signals.
    pub fn new(
        repo: Arc<PostRepository>,
        presenter: Arc<dyn Presenter>,
        max_post_length: usize,
    ) -> Self {
        repo.subscribe(presenter.clone());
        Self {
            repo,
            presenter,
            max_post_length,
        }
    }

    pub fn repository(&self) -> &Arc<PostRepository> {
        &self.repo
    }

    pub fn max_post_length(&self) -> usize {
        self.max_post_length
    }

    pub async fn load_and_render(&self) -> Vec<Post> {
        self.presenter.render_loading();
        let posts = self.repo.load().await;
        self.presenter.render_list(&posts);
        posts
    }

    /// Composer rules: non-empty after trimming, at most `max_post_length`
    /// characters.
    pub fn validate(&self, content: &str) -> Result<()> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(AppError::ValidationError(
                "الرجاء كتابة محتوى للهمسة".to_string(),
            ));
        }
        if char_count(trimmed) > self.max_post_length {
            return Err(AppError::ValidationError(format!(
                "النص طويل جداً (الحد الأقصى {} حرف)",
                self.max_post_length
            )));
        }
        Ok(())
    }

    pub async fn create_post(&self, content: &str, mood: Mood, anonymous: bool) -> Result<Post> {
        self.validate(content)?;
        let post = self.repo.create(content.trim(), mood, anonymous).await;
        self.presenter.render_list(&self.repo.posts().await);
        Ok(post)
    }

    pub async fn toggle_like(&self, post_id: &PostId) -> Option<LikeState> {
        let state = self.repo.toggle_like(post_id).await;
        if state.is_none() {
            debug!(%post_id, "like on unknown whisper ignored");
        }
        state
    }
}
