//! Query aggregation.
//!
//! [`Aggregator::enumerate`] expands entities x query definitions into a fixed
//! plan and hands back an [`Enumeration`], a single-pass cursor that runs one
//! backend call per [`Enumeration::next_batch`].
//!
//! Plan order: the crt.sh partition, then custom search, then Google web
//! search, then `DuckDuckGo`. Inside a partition, query definitions keep lookup
//! order and each one walks every entity in lookup order. Web search
//! partitions pause after each query definition's entities.

use std::collections::VecDeque;
use std::time::Duration;

use harvest_core::{Entity, QueryDefinition, ResultRecord, Service};

use crate::http::random_delay;
use crate::{Dispatcher, PreparedQuery};

/// Randomized pause after each paced query definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    floor_secs: u64,
    spread_secs: u64,
}

impl Pacing {
    #[must_use]
    pub const fn new(floor_secs: u64, spread_secs: u64) -> Self {
        Self {
            floor_secs,
            spread_secs,
        }
    }

    /// No pause at all.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// A random delay in `floor..=floor + spread` seconds.
    #[must_use]
    pub fn delay(&self) -> Duration {
        random_delay(
            self.floor_secs,
            self.floor_secs.saturating_add(self.spread_secs),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Dispatch(PreparedQuery),
    Pause,
}

/// Drives query definitions against a [`Dispatcher`].
pub struct Aggregator<'d, D> {
    dispatcher: &'d D,
    pacing: Pacing,
}

impl<'d, D: Dispatcher> Aggregator<'d, D> {
    #[must_use]
    pub const fn new(dispatcher: &'d D, pacing: Pacing) -> Self {
        Self { dispatcher, pacing }
    }

    #[must_use]
    pub const fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Plan every (query definition x entity) pair.
    ///
    /// Disabled rows and unknown services are dropped here. Pairs whose
    /// template cannot be rendered for an entity, or renders empty, are
    /// skipped; so are crt.sh pairs for entities without a site. Nothing is
    /// sent until the returned cursor is polled.
    #[must_use]
    pub fn enumerate(
        &self,
        entities: Vec<Entity>,
        queries: Vec<QueryDefinition>,
    ) -> Enumeration<'d, D> {
        let entities: Vec<Entity> = entities.into_iter().filter(|e| !e.disabled).collect();
        let queries: Vec<(Service, QueryDefinition)> = queries
            .into_iter()
            .filter(|q| !q.disabled)
            .filter_map(|q| match q.service() {
                Some(service) => Some((service, q)),
                None => {
                    tracing::warn!(
                        service = %q.selector,
                        label = %q.label,
                        "ignoring query for unknown service"
                    );
                    None
                }
            })
            .collect();

        let mut plan = VecDeque::new();
        for partition in Service::PARTITION_ORDER {
            for (_, query) in queries.iter().filter(|(s, _)| *s == partition) {
                for entity in &entities {
                    if let Some(text) = prepare_text(partition, query, entity) {
                        plan.push_back(Step::Dispatch(PreparedQuery {
                            service: partition,
                            text,
                            label: query.label.clone(),
                            entity: entity.id.clone(),
                        }));
                    }
                }
                if partition.is_paced() {
                    plan.push_back(Step::Pause);
                }
            }
        }

        tracing::debug!(
            entities = entities.len(),
            queries = queries.len(),
            steps = plan.len(),
            "planned dork run"
        );
        Enumeration {
            dispatcher: self.dispatcher,
            pacing: self.pacing,
            plan,
        }
    }
}

fn prepare_text(service: Service, query: &QueryDefinition, entity: &Entity) -> Option<String> {
    if !service.uses_template() {
        return Some(entity.site.clone()).filter(|site| !site.is_empty());
    }
    match entity.render(&query.template) {
        Ok(text) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(
                label = %query.label,
                entity = %entity.id,
                %e,
                "skipping query for entity"
            );
            None
        }
    }
}

/// Single-pass cursor over the result batches of one run.
pub struct Enumeration<'d, D> {
    dispatcher: &'d D,
    pacing: Pacing,
    plan: VecDeque<Step>,
}

impl<D: Dispatcher> Enumeration<'_, D> {
    /// Run the next backend call and return its batch.
    ///
    /// Pauses that fall before the call are taken first; a trailing pause is
    /// taken before `None` is returned. Batches may be empty. Records missing
    /// a label or entity are dropped.
    pub async fn next_batch(&mut self) -> Option<Vec<ResultRecord>> {
        while let Some(step) = self.plan.pop_front() {
            match step {
                Step::Pause => self.dispatcher.pause(self.pacing.delay()).await,
                Step::Dispatch(query) => {
                    let mut batch = self.dispatcher.dispatch(&query).await;
                    batch.retain(|record| record.metadata().is_complete());
                    return Some(batch);
                }
            }
        }
        None
    }

    /// Drain the cursor, concatenating every batch in order.
    pub async fn collect_all(mut self) -> Vec<ResultRecord> {
        let mut records = Vec::new();
        while let Some(batch) = self.next_batch().await {
            records.extend(batch);
        }
        records
    }

    /// Backend calls not yet made.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.plan
            .iter()
            .filter(|step| matches!(step, Step::Dispatch(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use harvest_core::entities::Row;
    use harvest_core::{RecordMetadata, Retrieved, WebEngine, WebSearchRecord};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<PreparedQuery>>,
        pauses: Mutex<Vec<Duration>>,
        /// When set, every call returns an empty batch.
        silent: bool,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<PreparedQuery> {
            self.calls.lock().unwrap().clone()
        }

        fn pause_count(&self) -> usize {
            self.pauses.lock().unwrap().len()
        }
    }

    impl Dispatcher for FakeBackend {
        async fn dispatch(&self, query: &PreparedQuery) -> Vec<ResultRecord> {
            self.calls.lock().unwrap().push(query.clone());
            if self.silent {
                return Vec::new();
            }
            vec![ResultRecord::WebSearch(WebSearchRecord {
                engine: WebEngine::Google,
                title: format!("{} hit", query.service),
                url: format!("https://{}/", query.entity),
                description: query.text.clone(),
                metadata: RecordMetadata::new(&query.label, &query.entity)
                    .with_retrieved(Retrieved::Summary("1 of 19 requested".into()))
                    .with_query(&query.text),
            })]
        }

        async fn pause(&self, delay: Duration) {
            self.pauses.lock().unwrap().push(delay);
        }
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn entity(id: &str, site: &str, disabled: &str) -> Entity {
        Entity::from_row(row(&[("entity", id), ("site", site), ("disabled", disabled)])).unwrap()
    }

    fn query(service: &str, label: &str, template: &str, disabled: &str) -> QueryDefinition {
        QueryDefinition::from_row(&row(&[
            ("service", service),
            ("label", label),
            ("query", template),
            ("disabled", disabled),
        ]))
        .unwrap()
    }

    async fn run(
        backend: &FakeBackend,
        entities: Vec<Entity>,
        queries: Vec<QueryDefinition>,
    ) -> Vec<ResultRecord> {
        Aggregator::new(backend, Pacing::none())
            .enumerate(entities, queries)
            .collect_all()
            .await
    }

    #[tokio::test]
    async fn disabled_rows_never_reach_the_backend() {
        let backend = FakeBackend::default();
        let entities = vec![
            entity("acme", "acme.com", "0"),
            entity("globex", "globex.com", "1"),
            entity("initech", "initech.com", "true"),
            entity("umbrella", "umbrella.com", "True"),
        ];
        let queries = vec![
            query("google_cse", "login", "site:{site} login", "0"),
            query("google_cse", "admin", "site:{site} admin", "True"),
            query("crt.sh", "certs", "", "1"),
        ];

        run(&backend, entities, queries).await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].entity, "acme");
        assert_eq!(calls[0].text, "site:acme.com login");
    }

    #[tokio::test]
    async fn missing_placeholder_skips_the_pair() {
        let backend = FakeBackend::default();
        let queries = vec![query("google_get", "pdfs", "site:{site} {missing} filetype:pdf", "0")];

        let records = run(&backend, vec![entity("acme", "acme.com", "0")], queries).await;

        assert!(records.is_empty());
        assert!(backend.calls().is_empty());
        // The pause after the query definition still happens.
        assert_eq!(backend.pause_count(), 1);
    }

    #[tokio::test]
    async fn empty_rendering_and_empty_site_are_skipped() {
        let backend = FakeBackend::default();
        let queries = vec![
            query("google_cse", "blank", "", "0"),
            query("crt.sh", "certs", "", "0"),
        ];

        run(&backend, vec![entity("acme", "", "0")], queries).await;

        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn partitions_run_in_fixed_order() {
        let backend = FakeBackend::default();
        let queries = vec![
            query("duckduckgo_html", "ddg", "{site} ddg", "0"),
            query("google_get", "get", "{site} get", "0"),
            query("bing", "unknown", "{site}", "0"),
            query("google_cse", "cse", "{site} cse", "0"),
            query("crt.sh", "certs", "", "0"),
        ];
        let entities = vec![entity("acme", "acme.com", "0"), entity("globex", "globex.com", "")];

        run(&backend, entities, queries).await;

        let order: Vec<(Service, String, String)> = backend
            .calls()
            .into_iter()
            .map(|c| (c.service, c.label, c.entity))
            .collect();
        let expected: Vec<(Service, String, String)> = [
            (Service::CrtSh, "certs", "acme"),
            (Service::CrtSh, "certs", "globex"),
            (Service::GoogleCse, "cse", "acme"),
            (Service::GoogleCse, "cse", "globex"),
            (Service::GoogleGet, "get", "acme"),
            (Service::GoogleGet, "get", "globex"),
            (Service::DuckDuckGo, "ddg", "acme"),
            (Service::DuckDuckGo, "ddg", "globex"),
        ]
        .into_iter()
        .map(|(s, l, e)| (s, l.to_string(), e.to_string()))
        .collect();
        assert_eq!(order, expected);
    }

    #[tokio::test]
    async fn crt_sh_uses_the_entity_site() {
        let backend = FakeBackend::default();
        run(
            &backend,
            vec![entity("acme", "acme.com", "0")],
            vec![query("crt.sh", "subs_from_certs", "ignored {nope}", "0")],
        )
        .await;
        assert_eq!(backend.calls()[0].text, "acme.com");
        assert_eq!(backend.pause_count(), 0);
    }

    #[tokio::test]
    async fn one_pause_per_paced_query_definition() {
        let backend = FakeBackend::default();
        let queries = vec![
            query("google_get", "a", "{site} a", "0"),
            query("google_get", "b", "{site} b", "0"),
            query("duckduckgo_html", "c", "{site} c", "0"),
            query("google_cse", "d", "{site} d", "0"),
        ];
        let entities = vec![entity("acme", "acme.com", "0"), entity("globex", "globex.com", "0")];

        run(&backend, entities, queries).await;

        assert_eq!(backend.calls().len(), 8);
        assert_eq!(backend.pause_count(), 3);
    }

    #[tokio::test]
    async fn runs_are_idempotent() {
        let entities = || vec![entity("acme", "acme.com", "0"), entity("globex", "globex.com", "0")];
        let queries = || {
            vec![
                query("crt.sh", "certs", "", "0"),
                query("google_cse", "login", "site:{site} login", "0"),
                query("duckduckgo_x", "admin", "site:{site} admin", "0"),
            ]
        };

        let first = run(&FakeBackend::default(), entities(), queries()).await;
        let second = run(&FakeBackend::default(), entities(), queries()).await;

        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cursor_yields_one_batch_per_call() {
        let backend = FakeBackend {
            silent: true,
            ..Default::default()
        };
        let aggregator = Aggregator::new(&backend, Pacing::none());
        let mut cursor = aggregator.enumerate(
            vec![entity("acme", "acme.com", "0")],
            vec![
                query("crt.sh", "certs", "", "0"),
                query("google_get", "get", "{site}", "0"),
            ],
        );
        assert_eq!(cursor.remaining(), 2);

        assert_eq!(cursor.next_batch().await, Some(Vec::new()));
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.next_batch().await, Some(Vec::new()));
        assert_eq!(cursor.next_batch().await, None);
        assert_eq!(cursor.next_batch().await, None);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(backend.pause_count(), 1);
    }

    #[test]
    fn pacing_delay_window() {
        for _ in 0..100 {
            let secs = Pacing::new(3, 5).delay().as_secs();
            assert!((3..=8).contains(&secs));
        }
        assert_eq!(Pacing::none().delay(), Duration::ZERO);
    }
}
