//! History -> selection -> concurrent resolution -> newest-first list.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{
    config::HISTORY_LIMIT,
    domain::{MediaDescriptor, Resolution, ResolvedMedia},
    errors::Error,
    media::select_media,
    ports::{ChannelHistory, FileLocator},
    Result,
};

/// Run the full pipeline for one request.
///
/// A history failure aborts the request; individual resolution failures only
/// shrink the result.
pub async fn collect_channel_media(
    history: &dyn ChannelHistory,
    locator: Arc<dyn FileLocator>,
) -> Result<Vec<ResolvedMedia>> {
    let messages = history.recent_messages(HISTORY_LIMIT).await?;
    tracing::info!(messages = messages.len(), "received channel history");

    let descriptors = select_media(&messages);
    tracing::info!(media = descriptors.len(), "selected media messages");

    let resolved = resolve_all(locator, descriptors).await?;
    tracing::info!(resolved = resolved.len(), "resolved media items");
    Ok(resolved)
}

/// Resolve one descriptor to a download locator.
///
/// Never fails: any lookup error becomes [`Resolution::Unresolved`].
pub async fn resolve_one(locator: &dyn FileLocator, descriptor: MediaDescriptor) -> Resolution {
    let MediaDescriptor {
        message_id,
        media_ref,
        display_caption,
    } = descriptor;

    let outcome = match locator.file_path(&media_ref).await {
        Ok(path) if path.is_empty() => Err(Error::ItemResolution {
            media_ref: media_ref.to_string(),
            reason: "empty file path".to_string(),
        }),
        other => other,
    };

    match outcome {
        Ok(path) => Resolution::Resolved(ResolvedMedia {
            id: message_id,
            caption: display_caption,
            download_url: locator.download_url(&path),
        }),
        Err(e) => {
            tracing::warn!(message_id = %message_id, error = %e, "skipping unresolved media");
            Resolution::Unresolved {
                message_id,
                reason: e.to_string(),
            }
        }
    }
}

/// Resolve every descriptor concurrently and return the successes newest-first.
///
/// All lookups are started before any is awaited and every one runs to
/// completion, even if another task faults or the caller drops this future.
/// Results are reassembled by input position, unresolved items are dropped,
/// and the remainder is reversed (history arrives oldest-to-newest).
pub async fn resolve_all(
    locator: Arc<dyn FileLocator>,
    descriptors: Vec<MediaDescriptor>,
) -> Result<Vec<ResolvedMedia>> {
    let total = descriptors.len();
    let mut set = DetachOnDrop(JoinSet::new());
    for (idx, descriptor) in descriptors.into_iter().enumerate() {
        let locator = locator.clone();
        set.0
            .spawn(async move { (idx, resolve_one(locator.as_ref(), descriptor).await) });
    }

    let mut slots: Vec<Option<Resolution>> = vec![None; total];
    let mut fault = None;
    while let Some(joined) = set.0.join_next().await {
        match joined {
            Ok((idx, resolution)) => slots[idx] = Some(resolution),
            Err(e) => {
                tracing::error!(error = %e, "media resolution task failed");
                if fault.is_none() {
                    fault = Some(Error::Join(e.to_string()));
                }
            }
        }
    }
    if let Some(e) = fault {
        return Err(e);
    }

    let mut resolved: Vec<ResolvedMedia> = slots
        .into_iter()
        .flatten()
        .filter_map(Resolution::into_resolved)
        .collect();
    resolved.reverse();
    Ok(resolved)
}

/// A `JoinSet` that lets its remaining tasks run on when dropped instead of
/// aborting them.
struct DetachOnDrop<T: 'static>(JoinSet<T>);

impl<T: 'static> Drop for DetachOnDrop<T> {
    fn drop(&mut self) {
        self.0.detach_all();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use super::*;
    use crate::domain::{Attachment, MediaRef, MessageId, RawMessage};

    struct FakeHistory {
        result: std::sync::Mutex<Option<Result<Vec<RawMessage>>>>,
        requested_limit: AtomicUsize,
    }

    impl FakeHistory {
        fn ok(messages: Vec<RawMessage>) -> Self {
            Self {
                result: std::sync::Mutex::new(Some(Ok(messages))),
                requested_limit: AtomicUsize::new(0),
            }
        }

        fn failing(err: Error) -> Self {
            Self {
                result: std::sync::Mutex::new(Some(Err(err))),
                requested_limit: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChannelHistory for FakeHistory {
        async fn recent_messages(&self, limit: u32) -> Result<Vec<RawMessage>> {
            self.requested_limit.store(limit as usize, Ordering::SeqCst);
            self.result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Default)]
    struct FakeLocator {
        failing: HashSet<String>,
        calls: AtomicUsize,
        barrier: Option<Barrier>,
    }

    #[async_trait]
    impl FileLocator for FakeLocator {
        async fn file_path(&self, media_ref: &MediaRef) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(b) = &self.barrier {
                b.wait().await;
            }
            if self.failing.contains(&media_ref.0) {
                return Err(Error::ItemResolution {
                    media_ref: media_ref.0.clone(),
                    reason: "Bad Request: file is too big".to_string(),
                });
            }
            Ok(format!("videos/{}.mp4", media_ref.0))
        }

        fn download_url(&self, file_path: &str) -> String {
            format!("https://files.test/{file_path}")
        }
    }

    fn video(id: i64, caption: &str) -> RawMessage {
        RawMessage {
            message_id: Some(id),
            caption: Some(caption.to_string()),
            video: Some(Attachment {
                file_id: Some(format!("f{id}")),
                file_name: None,
            }),
            document: None,
        }
    }

    fn descriptor(id: i64) -> MediaDescriptor {
        MediaDescriptor {
            message_id: MessageId(id),
            media_ref: MediaRef(format!("f{id}")),
            display_caption: format!("caption {id}"),
        }
    }

    #[tokio::test]
    async fn all_resolved_come_back_newest_first() {
        let history = FakeHistory::ok(vec![video(1, "one"), video(2, "two"), video(3, "three")]);
        let locator = Arc::new(FakeLocator::default());

        let out = collect_channel_media(&history, locator.clone()).await.unwrap();

        assert_eq!(
            history.requested_limit.load(Ordering::SeqCst),
            HISTORY_LIMIT as usize
        );
        assert_eq!(locator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            out,
            vec![
                ResolvedMedia {
                    id: MessageId(3),
                    caption: "three".into(),
                    download_url: "https://files.test/videos/f3.mp4".into(),
                },
                ResolvedMedia {
                    id: MessageId(2),
                    caption: "two".into(),
                    download_url: "https://files.test/videos/f2.mp4".into(),
                },
                ResolvedMedia {
                    id: MessageId(1),
                    caption: "one".into(),
                    download_url: "https://files.test/videos/f1.mp4".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn one_failure_drops_exactly_one_item() {
        let locator = Arc::new(FakeLocator {
            failing: HashSet::from(["f2".to_string()]),
            ..Default::default()
        });
        let descriptors: Vec<_> = (1..=4).map(descriptor).collect();

        let out = resolve_all(locator, descriptors).await.unwrap();

        assert_eq!(out.len(), 3);
        let pairs: Vec<_> = out.iter().map(|m| (m.id.0, m.caption.as_str())).collect();
        assert_eq!(
            pairs,
            vec![(4, "caption 4"), (3, "caption 3"), (1, "caption 1")]
        );
    }

    #[tokio::test]
    async fn final_order_is_reverse_of_selection_restricted_to_successes() {
        let locator = Arc::new(FakeLocator {
            failing: HashSet::from(["f10".to_string(), "f30".to_string()]),
            ..Default::default()
        });
        let descriptors: Vec<_> = [10, 20, 30, 40, 50].into_iter().map(descriptor).collect();

        let mut expected: Vec<i64> = descriptors
            .iter()
            .map(|d| d.message_id.0)
            .filter(|id| *id != 10 && *id != 30)
            .collect();
        expected.reverse();

        let out = resolve_all(locator, descriptors).await.unwrap();
        assert_eq!(out.iter().map(|m| m.id.0).collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn all_failures_yield_empty_list_not_error() {
        let locator = Arc::new(FakeLocator {
            failing: HashSet::from(["f1".to_string(), "f2".to_string()]),
            ..Default::default()
        });
        let out = resolve_all(locator, vec![descriptor(1), descriptor(2)])
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn lookups_run_concurrently() {
        // Every lookup blocks until all of them have started; sequential
        // execution would never get past the first one.
        let n = 5;
        let locator = Arc::new(FakeLocator {
            barrier: Some(Barrier::new(n)),
            ..Default::default()
        });
        let descriptors: Vec<_> = (1..=n as i64).map(descriptor).collect();

        let out = tokio::time::timeout(Duration::from_secs(5), resolve_all(locator, descriptors))
            .await
            .expect("resolution deadlocked; lookups are not concurrent")
            .unwrap();
        assert_eq!(out.len(), n);
    }

    #[tokio::test]
    async fn history_failure_aborts_before_resolution() {
        let history = FakeHistory::failing(Error::UpstreamUnavailable("Not Found".into()));
        let locator = Arc::new(FakeLocator::default());

        let err = collect_channel_media(&history, locator.clone())
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        assert_eq!(locator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_media_messages_are_not_resolved() {
        let text = RawMessage {
            message_id: Some(2),
            caption: Some("hello".into()),
            ..Default::default()
        };
        let history = FakeHistory::ok(vec![video(1, "a"), text.clone(), text, video(4, "b")]);
        let locator = Arc::new(FakeLocator::default());

        let out = collect_channel_media(&history, locator.clone()).await.unwrap();

        assert_eq!(locator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(out.iter().map(|m| m.id.0).collect::<Vec<_>>(), vec![4, 1]);
    }

    #[tokio::test]
    async fn empty_path_counts_as_unresolved() {
        struct EmptyPath;

        #[async_trait]
        impl FileLocator for EmptyPath {
            async fn file_path(&self, _media_ref: &MediaRef) -> Result<String> {
                Ok(String::new())
            }

            fn download_url(&self, file_path: &str) -> String {
                file_path.to_string()
            }
        }

        let r = resolve_one(&EmptyPath, descriptor(7)).await;
        assert!(matches!(
            r,
            Resolution::Unresolved { message_id: MessageId(7), .. }
        ));
    }

    /// One lookup panics, one is slow; the slow one records when it finishes.
    #[derive(Default)]
    struct PanickyLocator {
        slow_done: Arc<AtomicBool>,
    }

    #[async_trait]
    impl FileLocator for PanickyLocator {
        async fn file_path(&self, media_ref: &MediaRef) -> Result<String> {
            match media_ref.0.as_str() {
                "f1" => panic!("lookup blew up"),
                "f2" => {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    self.slow_done.store(true, Ordering::SeqCst);
                    Ok("videos/slow.mp4".to_string())
                }
                _ => Ok("videos/fast.mp4".to_string()),
            }
        }

        fn download_url(&self, file_path: &str) -> String {
            file_path.to_string()
        }
    }

    #[tokio::test]
    async fn task_fault_waits_for_slow_siblings() {
        let locator = Arc::new(PanickyLocator::default());
        let slow_done = locator.slow_done.clone();

        let err = resolve_all(locator, vec![descriptor(1), descriptor(2), descriptor(3)])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Join(_)));
        assert!(slow_done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn abandoned_batch_keeps_lookups_running() {
        let locator = Arc::new(PanickyLocator::default());
        let slow_done = locator.slow_done.clone();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            resolve_all(locator, vec![descriptor(2), descriptor(3)]),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!slow_done.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(slow_done.load(Ordering::SeqCst));
    }
}
