//! In-process doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{Post, PostId};
use crate::traits::{LocalCache, Presenter};

#[derive(Default)]
pub struct MapCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MapCache {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: Value) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }
}

#[async_trait]
impl LocalCache for MapCache {
    async fn save(&self, key: &str, value: &Value) {
        self.put(key, value.clone());
    }

    async fn load(&self, key: &str) -> Option<Value> {
        self.get(key)
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    lists: Mutex<Vec<Vec<PostId>>>,
    likes: Mutex<Vec<(PostId, bool, u64)>>,
    loading: Mutex<usize>,
}

impl RecordingPresenter {
    pub fn rendered_lists(&self) -> Vec<Vec<PostId>> {
        self.lists.lock().unwrap().clone()
    }

    pub fn like_signals(&self) -> Vec<(PostId, bool, u64)> {
        self.likes.lock().unwrap().clone()
    }

    pub fn loading_calls(&self) -> usize {
        *self.loading.lock().unwrap()
    }
}

impl Presenter for RecordingPresenter {
    fn render_list(&self, posts: &[Post]) {
        self.lists
            .lock()
            .unwrap()
            .push(posts.iter().map(|p| p.id.clone()).collect());
    }

    fn render_like_state(&self, post_id: &PostId, is_liked: bool, likes_count: u64) {
        self.likes
            .lock()
            .unwrap()
            .push((post_id.clone(), is_liked, likes_count));
    }

    fn render_loading(&self) {
        *self.loading.lock().unwrap() += 1;
    }
}
