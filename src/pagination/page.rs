use super::ListOptions;
use crate::arm::http::{Request, Response, Transport};
use crate::error::PaginationError;
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One page of a list result. Pages are immutable; loading more yields a
/// new page and leaves this one untouched.
pub struct Page<T> {
    items: Vec<T>,
    next_link: Option<String>,
    transport: Arc<dyn Transport>,
    options: Arc<ListOptions>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Page<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("items", &self.items)
            .field("next_link", &self.next_link)
            .finish()
    }
}

impl<T: DeserializeOwned> Page<T> {
    pub(super) async fn fetch(
        transport: Arc<dyn Transport>,
        url: &str,
        options: Arc<ListOptions>,
        cancel: &CancellationToken,
    ) -> Result<Self, PaginationError> {
        if cancel.is_cancelled() {
            return Err(PaginationError::Cancelled);
        }

        tracing::debug!("GET page {}", url);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PaginationError::Cancelled),
            response = transport.send(Request::get(url)) => response?,
        };

        let (items, next_link) = decode(response, &options)?;
        Ok(Self {
            items,
            next_link,
            transport,
            options,
        })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Continuation link, exactly as the server sent it
    pub fn next_link(&self) -> Option<&str> {
        self.next_link.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }

    /// Fetch the page after this one
    pub async fn load_more(&self, cancel: &CancellationToken) -> Result<Self, PaginationError> {
        let Some(next_link) = &self.next_link else {
            return Err(PaginationError::NoMorePages);
        };

        Self::fetch(
            Arc::clone(&self.transport),
            next_link,
            Arc::clone(&self.options),
            cancel,
        )
        .await
    }

    /// Drain this page and every following one, keeping the items the
    /// predicate accepts in server order. Nothing is returned if any page
    /// fails.
    pub async fn complete<F>(
        self,
        cancel: &CancellationToken,
        mut predicate: F,
    ) -> Result<Vec<T>, PaginationError>
    where
        F: FnMut(&T) -> bool,
    {
        let mut matched = Vec::new();
        let mut page = self;

        loop {
            let next = if page.has_more() {
                Some(page.load_more(cancel).await?)
            } else {
                None
            };
            matched.extend(page.items.into_iter().filter(|item| predicate(item)));

            match next {
                Some(next) => page = next,
                None => return Ok(matched),
            }
        }
    }

    /// Items of this page and its successors as a stream. Each page is
    /// fetched only once the previous page's items have been consumed.
    pub fn into_stream(
        self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<T, PaginationError>> {
        stream::try_unfold((Some(self), true), move |(page, first)| {
            let cancel = cancel.clone();
            async move {
                let Some(page) = page else {
                    return Ok(None);
                };
                let mut page = if first {
                    page
                } else {
                    page.load_more(&cancel).await?
                };

                let items = std::mem::take(&mut page.items);
                let next = page.has_more().then_some(page);
                Ok::<_, PaginationError>(Some((items, (next, false))))
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
    }
}

fn decode<T: DeserializeOwned>(
    response: Response,
    options: &ListOptions,
) -> Result<(Vec<T>, Option<String>), PaginationError> {
    if !response.is_success() {
        return Err(PaginationError::Status {
            url: response.url,
            status: response.status,
            body: response.body,
        });
    }

    let decode_error = |reason: String| PaginationError::Decode {
        url: response.url.clone(),
        status: response.status,
        reason,
    };

    let body = match &response.body {
        Some(Value::Object(body)) => body,
        // an empty body is an empty page
        None => return Ok((Vec::new(), None)),
        Some(_) => return Err(decode_error("page body is not a JSON object".to_string())),
    };

    let items = match body.get(&options.items_field) {
        None | Some(Value::Null) => Vec::new(),
        Some(items @ Value::Array(_)) => {
            serde_json::from_value(items.clone()).map_err(|e| decode_error(e.to_string()))?
        }
        Some(_) => {
            return Err(decode_error(format!(
                "field {:?} is not an array",
                options.items_field
            )))
        }
    };

    let next_link = body
        .get(&options.next_link_field)
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
        .map(str::to_string);

    Ok((items, next_link))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::pagination::list;
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned pages by url and counts fetches
    struct Pages {
        pages: HashMap<String, Response>,
        fetches: AtomicUsize,
    }

    impl Pages {
        fn new(pages: Vec<(&str, Response)>) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .into_iter()
                    .map(|(url, r)| (url.to_string(), r))
                    .collect(),
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for Pages {
        async fn send(&self, request: Request) -> Result<Response, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(&request.url)
                .cloned()
                .ok_or_else(|| TransportError::Connection {
                    url: request.url,
                    reason: "no such page".to_string(),
                })
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        name: String,
    }

    fn page(url: &str, names: &[&str], next: Option<&str>) -> (String, Response) {
        let value: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
        let mut body = json!({"value": value});
        if let Some(next) = next {
            body["nextLink"] = json!(next);
        }
        (url.to_string(), Response::new(url, 200).with_body(body))
    }

    fn three_pages() -> Arc<Pages> {
        let pages = vec![
            page("https://h/w", &["a", "b"], Some("https://h/w?page=2")),
            page("https://h/w?page=2", &["c"], Some("https://h/w?page=3")),
            page("https://h/w?page=3", &["d", "e"], None),
        ];
        Pages::new(pages.iter().map(|(u, r)| (u.as_str(), r.clone())).collect())
    }

    fn names(widgets: &[Widget]) -> Vec<&str> {
        widgets.iter().map(|w| w.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_complete_fetches_each_page_once() {
        let transport = three_pages();
        let first = list::<Widget>(transport.clone(), "https://h/w", ListOptions::default())
            .await
            .unwrap();

        let all = first.complete(&CancellationToken::new(), |_| true).await.unwrap();
        assert_eq!(names(&all), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(transport.fetches(), 3);
    }

    #[tokio::test]
    async fn test_complete_applies_predicate_in_order() {
        let transport = three_pages();
        let first = list::<Widget>(transport, "https://h/w", ListOptions::default())
            .await
            .unwrap();

        let picked = first
            .complete(&CancellationToken::new(), |w| w.name != "b" && w.name != "d")
            .await
            .unwrap();
        assert_eq!(names(&picked), vec!["a", "c", "e"]);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let (url, response) = page("https://h/w", &[], None);
        let transport = Pages::new(vec![(url.as_str(), response)]);

        let first = list::<Widget>(transport.clone(), "https://h/w", ListOptions::default())
            .await
            .unwrap();
        assert!(!first.has_more());

        let all = first.complete(&CancellationToken::new(), |_| true).await.unwrap();
        assert!(all.is_empty());
        assert_eq!(transport.fetches(), 1);
    }

    #[tokio::test]
    async fn test_load_more_leaves_receiver_untouched() {
        let transport = three_pages();
        let first = list::<Widget>(transport, "https://h/w", ListOptions::default())
            .await
            .unwrap();

        let second = first.load_more(&CancellationToken::new()).await.unwrap();
        assert_eq!(names(first.items()), vec!["a", "b"]);
        assert_eq!(first.next_link(), Some("https://h/w?page=2"));
        assert_eq!(names(second.items()), vec!["c"]);
    }

    #[tokio::test]
    async fn test_load_more_without_link() {
        let (url, response) = page("https://h/w", &["a"], None);
        let transport = Pages::new(vec![(url.as_str(), response)]);
        let only = list::<Widget>(transport, "https://h/w", ListOptions::default())
            .await
            .unwrap();

        let err = only.load_more(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, PaginationError::NoMorePages));
    }

    #[tokio::test]
    async fn test_mid_drain_failure_discards_items() {
        let mut pages = vec![
            page("https://h/w", &["a"], Some("https://h/w?page=2")),
            page("https://h/w?page=2", &["b"], Some("https://h/w?page=3")),
        ];
        pages.push((
            "https://h/w?page=3".to_string(),
            Response::new("https://h/w?page=3", 500).with_body(json!({"error": {"code": "Boom"}})),
        ));
        let transport = Pages::new(pages.iter().map(|(u, r)| (u.as_str(), r.clone())).collect());

        let first = list::<Widget>(transport, "https://h/w", ListOptions::default())
            .await
            .unwrap();
        let err = first.complete(&CancellationToken::new(), |_| true).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        match err {
            PaginationError::Status { url, body, .. } => {
                assert_eq!(url, "https://h/w?page=3");
                assert_eq!(body, Some(json!({"error": {"code": "Boom"}})));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_drain() {
        let transport = three_pages();
        let first = list::<Widget>(transport.clone(), "https://h/w", ListOptions::default())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = first.complete(&cancel, |_| true).await.unwrap_err();
        assert!(matches!(err, PaginationError::Cancelled));
        assert_eq!(transport.fetches(), 1);
    }

    #[tokio::test]
    async fn test_custom_field_names() {
        let transport = Pages::new(vec![(
            "https://h/w",
            Response::new("https://h/w", 200).with_body(json!({"items": [{"name": "a"}], "next": ""})),
        )]);
        let options = ListOptions {
            items_field: "items".to_string(),
            next_link_field: "next".to_string(),
        };

        let first = list::<Widget>(transport, "https://h/w", options).await.unwrap();
        assert_eq!(names(first.items()), vec!["a"]);
        assert!(!first.has_more());
    }

    #[tokio::test]
    async fn test_malformed_items() {
        let transport = Pages::new(vec![(
            "https://h/w",
            Response::new("https://h/w", 200).with_body(json!({"value": {"name": "a"}})),
        )]);

        let err = list::<Widget>(transport, "https://h/w", ListOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::Decode { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_stream_yields_items_lazily() {
        let transport = three_pages();
        let first = list::<Widget>(transport.clone(), "https://h/w", ListOptions::default())
            .await
            .unwrap();

        let mut stream = Box::pin(first.into_stream(CancellationToken::new()));
        let a = stream.next().await.unwrap().unwrap();
        let b = stream.next().await.unwrap().unwrap();
        assert_eq!((a.name.as_str(), b.name.as_str()), ("a", "b"));
        assert_eq!(transport.fetches(), 1);

        let rest: Vec<Widget> = stream.map(|item| item.unwrap()).collect().await;
        assert_eq!(names(&rest), vec!["c", "d", "e"]);
        assert_eq!(transport.fetches(), 3);
    }
}
