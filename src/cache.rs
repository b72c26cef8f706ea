use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::api::{ApiState, BackendApi};
use crate::models::{
    Article, ArticleQuery, AuthUser, Course, EnrollmentCheck, EnrollmentRequestPayload,
    EnrollmentSubmitResult,
};

/// TtlMap
///
/// A small time-bounded map. Expired entries read as absent and are pruned on the next
/// insert; there is no background eviction since the key space (catalog slugs) is tiny.
struct TtlMap<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlMap<K, V> {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, key: &K) -> Option<V> {
        let guard = self.entries.read().await;
        guard
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    async fn insert(&self, key: K, value: V) {
        let mut guard = self.entries.write().await;
        guard.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        guard.insert(key, (Instant::now(), value));
    }
}

/// CachedBackendApi
///
/// Decorates any `BackendApi` with a TTL cache over the public catalog reads, so a burst of
/// page views costs one upstream call per TTL window. Calls carrying a student token are
/// never cached.
///
/// Empty lists and `None` are not stored: they are also what an upstream outage looks
/// like, and the next request should retry.
pub struct CachedBackendApi {
    inner: ApiState,
    courses: TtlMap<(), Vec<Course>>,
    course_by_slug: TtlMap<String, Course>,
    articles: TtlMap<(Option<String>, Option<u32>), Vec<Article>>,
    article_by_slug: TtlMap<String, Article>,
}

impl CachedBackendApi {
    pub fn new(inner: ApiState, ttl: Duration) -> Self {
        Self {
            inner,
            courses: TtlMap::new(ttl),
            course_by_slug: TtlMap::new(ttl),
            articles: TtlMap::new(ttl),
            article_by_slug: TtlMap::new(ttl),
        }
    }
}

#[async_trait]
impl BackendApi for CachedBackendApi {
    async fn get_courses(&self) -> Vec<Course> {
        if let Some(hit) = self.courses.get(&()).await {
            return hit;
        }
        let fresh = self.inner.get_courses().await;
        if !fresh.is_empty() {
            self.courses.insert((), fresh.clone()).await;
        }
        fresh
    }

    async fn get_course_by_slug(&self, slug: &str) -> Option<Course> {
        let key = slug.to_string();
        if let Some(hit) = self.course_by_slug.get(&key).await {
            return Some(hit);
        }
        let fresh = self.inner.get_course_by_slug(slug).await?;
        self.course_by_slug.insert(key, fresh.clone()).await;
        Some(fresh)
    }

    async fn get_articles(&self, query: &ArticleQuery) -> Vec<Article> {
        let key = (query.category.clone(), query.per_page);
        if let Some(hit) = self.articles.get(&key).await {
            return hit;
        }
        let fresh = self.inner.get_articles(query).await;
        if !fresh.is_empty() {
            self.articles.insert(key, fresh.clone()).await;
        }
        fresh
    }

    async fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        let key = slug.to_string();
        if let Some(hit) = self.article_by_slug.get(&key).await {
            return Some(hit);
        }
        let fresh = self.inner.get_article_by_slug(slug).await?;
        self.article_by_slug.insert(key, fresh.clone()).await;
        Some(fresh)
    }

    fn google_login_url(&self, redirect_to: &str) -> String {
        self.inner.google_login_url(redirect_to)
    }

    async fn fetch_me(&self, token: &str) -> Option<AuthUser> {
        self.inner.fetch_me(token).await
    }

    async fn logout(&self, token: &str) {
        self.inner.logout(token).await
    }

    async fn submit_enrollment(
        &self,
        token: &str,
        payload: &EnrollmentRequestPayload,
    ) -> EnrollmentSubmitResult {
        self.inner.submit_enrollment(token, payload).await
    }

    async fn check_enrollment(&self, token: &str, course_slug: &str) -> EnrollmentCheck {
        self.inner.check_enrollment(token, course_slug).await
    }
}
