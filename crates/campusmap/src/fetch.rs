use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::api::{ApiError, CampusApi, RouteQuery};
use crate::model::{Building, RouteSegment};
use crate::selection::RequestId;

/// A finished background request.
#[derive(Debug)]
pub enum FetchEvent {
    Buildings(Result<Vec<Building>, ApiError>),
    Route {
        id: RequestId,
        result: Result<Vec<RouteSegment>, ApiError>,
    },
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Runs API calls off the UI thread and queues their results for `poll`.
pub struct Fetcher {
    /// Always `Some` until drop.
    runtime: Option<Runtime>,
    api: Arc<dyn CampusApi>,
    tx: UnboundedSender<FetchEvent>,
    rx: UnboundedReceiver<FetchEvent>,
    waker: Option<Waker>,
}

impl Fetcher {
    pub fn new(api: Arc<dyn CampusApi>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("campusmap-fetch")
            .enable_all()
            .build()?;
        let (tx, rx) = unbounded_channel();
        Ok(Self {
            runtime: Some(runtime),
            api,
            tx,
            rx,
            waker: None,
        })
    }

    /// Called after every queued event, typically to request a repaint.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    pub fn fetch_buildings(&self) {
        self.spawn(|api| FetchEvent::Buildings(api.buildings()));
    }

    pub fn fetch_route(&self, id: RequestId, query: RouteQuery) {
        self.spawn(move |api| FetchEvent::Route {
            id,
            result: api.route(&query),
        });
    }

    /// Drain everything that has completed since the last call.
    pub fn poll(&mut self) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn spawn<F>(&self, call: F)
    where
        F: FnOnce(&dyn CampusApi) -> FetchEvent + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let Some(runtime) = &self.runtime else {
            return;
        };
        runtime.spawn_blocking(move || {
            let event = call(api.as_ref());
            // The receiver only goes away with the Fetcher itself.
            if tx.send(event).is_ok() {
                if let Some(wake) = waker {
                    wake();
                }
            }
        });
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        // Don't block the closing window on a request that is still waiting for its timeout.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::RouteOverlayForm;
    use crate::model::Point;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Answers "slow" routes after a delay so responses arrive out of order.
    struct FakeApi {
        calls: AtomicUsize,
    }

    impl CampusApi for FakeApi {
        fn buildings(&self) -> Result<Vec<Building>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Building::new("BAG", "Bagley Hall"),
                Building::new("CSE", "Allen Center"),
                Building::new("MGH", "Mary Gates Hall"),
            ])
        }

        fn route(&self, query: &RouteQuery) -> Result<Vec<RouteSegment>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.end == "MGH" {
                std::thread::sleep(Duration::from_millis(200));
            }
            let x = if query.end == "MGH" { 100.0 } else { 50.0 };
            Ok(vec![RouteSegment::new(Point::new(0.0, 0.0), Point::new(x, x))])
        }
    }

    fn wait_for(fetcher: &mut Fetcher, count: usize) -> Vec<FetchEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.len() < count && Instant::now() < deadline {
            events.extend(fetcher.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_buildings_and_waker() {
        let woken = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&woken);
        let api = Arc::new(FakeApi {
            calls: AtomicUsize::new(0),
        });
        let mut fetcher = Fetcher::new(api.clone())
            .unwrap()
            .with_waker(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        fetcher.fetch_buildings();
        let events = wait_for(&mut fetcher, 1);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], FetchEvent::Buildings(Ok(b)) if b.len() == 3));
        // The waker runs right after the send, so give it a moment.
        let deadline = Instant::now() + Duration::from_secs(1);
        while woken.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(woken.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_out_of_order_responses_keep_latest_request() {
        let api = Arc::new(FakeApi {
            calls: AtomicUsize::new(0),
        });
        let mut fetcher = Fetcher::new(api).unwrap();
        let mut form = RouteOverlayForm::new();

        fetcher.fetch_buildings();
        for event in wait_for(&mut fetcher, 1) {
            form.apply(event);
        }

        // Slow request first, then a fast one that supersedes it.
        form.set_start("BAG");
        form.set_end("MGH");
        let (slow_id, slow) = form.submit().unwrap();
        fetcher.fetch_route(slow_id, slow);
        form.set_end("CSE");
        let (fast_id, fast) = form.submit().unwrap();
        fetcher.fetch_route(fast_id, fast);

        let events = wait_for(&mut fetcher, 2);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], FetchEvent::Route { id, .. } if *id == fast_id));
        for event in events {
            form.apply(event);
        }
        assert_eq!(form.route().len(), 1);
        assert_eq!(form.route()[0].destination, Point::new(50.0, 50.0));
    }
}
