use std::collections::VecDeque;

use super::{MediaSink, PendingOperation, PushSegmentError};
use crate::{
    bindings::Host, channel::MediaSegment, config::BufferPolicy, error::PlayerError,
    utils::time_ranges::TimeRanges, Logger,
};

/// What happened to a segment given to `BufferFeeder::on_segment`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SegmentArrival {
    /// The segment is being appended.
    Appended,

    /// An operation was pending, the segment now waits in the queue.
    Queued { depth: usize },

    /// The queue went over its maximum depth and was emptied, the new segment included.
    QueueReset { dropped: usize },
}

/// What `BufferFeeder::feed` did once the sink became idle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum FeedStep {
    /// The oldest queued segment is being appended.
    AppendedQueued,

    /// Nothing is buffered yet.
    NeedsSegment,

    /// Too much is buffered, old data is being removed.
    Trimmed { start: f64, end: f64 },

    /// Several disjoint ranges are buffered, everything before the last one is being
    /// removed.
    Coalesced { start: f64, end: f64 },

    /// Playback was too far from the live edge and has been moved to `position`.
    Seeked { position: f64 },

    /// Nothing to do.
    Steady,
}

/// Feeds media segments to a `MediaSink` while keeping its buffer small, gapless and
/// close to the live edge.
///
/// At most one operation (append or removal) is pending on the sink at any time:
/// segments arriving in the meantime are queued and appended in arrival order.
pub(crate) struct BufferFeeder {
    policy: BufferPolicy,
    sink: MediaSink,

    /// Segments waiting for the sink to be idle.
    queue: VecDeque<MediaSegment>,

    /// Duration of the last segment received, in seconds.
    last_duration: Option<f64>,

    /// Amount of media, in seconds, we want to keep in the buffer.
    target_duration: f64,

    /// Buffered span measured when the last removal was started.
    ///
    /// Used to avoid looping on a removal the platform does not perform.
    last_trimmed_span: Option<f64>,
}

impl BufferFeeder {
    pub(crate) fn new(policy: BufferPolicy) -> Self {
        Self {
            target_duration: round_centiseconds(policy.min_seconds),
            policy,
            sink: MediaSink::new(),
            queue: VecDeque::new(),
            last_duration: None,
            last_trimmed_span: None,
        }
    }

    pub(crate) fn sink(&self) -> &MediaSink {
        &self.sink
    }

    pub(crate) fn sink_mut(&mut self) -> &mut MediaSink {
        &mut self.sink
    }

    #[cfg(test)]
    pub(crate) fn target_duration(&self) -> f64 {
        self.target_duration
    }

    #[cfg(test)]
    pub(crate) fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Returns the `(far, near)` positions playback should stay between, for a single
    /// buffered range going from `start` to `end`.
    pub(crate) fn seek_window(&self, start: f64, end: f64) -> (f64, f64) {
        let far = f64::max(start, end - self.policy.far_factor * self.target_duration);
        let near = end - self.policy.near_factor * self.target_duration;
        (far, near)
    }

    /// Append a new media segment, or queue it if an operation is pending.
    pub(crate) fn on_segment<H: Host>(
        &mut self,
        host: &mut H,
        segment: MediaSegment,
    ) -> Result<SegmentArrival, PushSegmentError> {
        self.update_target_duration(segment.duration);
        if !self.sink.is_busy() && self.queue.is_empty() {
            self.sink
                .push_media_segment(host, segment.resource_id, segment.sequence)?;
            return Ok(SegmentArrival::Appended);
        }

        self.queue.push_back(segment);
        if self.queue.len() > self.policy.max_queue_depth {
            let dropped = self.queue.len();
            Logger::warn(&format!(
                "Feeder: Queue over {} segments, dropping all {} queued segments",
                self.policy.max_queue_depth, dropped
            ));
            for segment in self.queue.drain(..) {
                host.free_resource(segment.resource_id);
            }
            return Ok(SegmentArrival::QueueReset { dropped });
        }
        Ok(SegmentArrival::Queued {
            depth: self.queue.len(),
        })
    }

    /// To call when the sink announced the end of its pending operation.
    pub(crate) fn on_operation_end(&mut self) -> Option<PendingOperation> {
        self.sink.on_operation_end()
    }

    /// Decide of the next operation now that the sink is idle, `buffered` being the
    /// time ranges it currently holds.
    pub(crate) fn feed<H: Host>(
        &mut self,
        host: &mut H,
        buffered: &TimeRanges,
    ) -> Result<FeedStep, PlayerError> {
        if self.sink.is_busy() {
            Logger::debug("Feeder: Sink still busy, nothing to feed");
            return Ok(FeedStep::Steady);
        }
        if let Some(segment) = self.queue.pop_front() {
            self.sink
                .push_media_segment(host, segment.resource_id, segment.sequence)?;
            return Ok(FeedStep::AppendedQueued);
        }

        let (first, last) = match (buffered.first(), buffered.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(FeedStep::NeedsSegment),
        };

        let live_duration = round_centiseconds(last.duration());
        let over_budget = live_duration > self.target_duration * self.policy.safety_margin;
        if over_budget || buffered.len() > 1 {
            let span = round_centiseconds(last.end() - first.start());
            if self.last_trimmed_span != Some(span) {
                self.last_trimmed_span = Some(span);
                let start = first.start();
                let (end, step) = if over_budget {
                    Logger::debug(&format!(
                        "Feeder: {}s buffered over a {}s target, trimming",
                        live_duration, self.target_duration
                    ));
                    let end = last.end() - self.target_duration;
                    (end, FeedStep::Trimmed { start, end })
                } else {
                    Logger::debug(&format!(
                        "Feeder: {} buffered ranges, coalescing",
                        buffered.len()
                    ));
                    let end = last.start();
                    (end, FeedStep::Coalesced { start, end })
                };
                self.sink.remove(host, start, end)?;
                return Ok(step);
            }
            Logger::debug("Feeder: Buffered span unchanged since last removal, not trimming");
        }

        if buffered.len() == 1 {
            let (far, near) = self.seek_window(last.start(), last.end());
            let current_time = host.current_time();
            if far < near && (current_time < far || current_time > near) {
                let position = (far + near) / 2.;
                Logger::info(&format!(
                    "Feeder: Position {} outside of [{}, {}], seeking to {}",
                    current_time, far, near, position
                ));
                host.seek(position);
                return Ok(FeedStep::Seeked { position });
            }
        }
        Ok(FeedStep::Steady)
    }

    /// Release queued segments and tear down the sink.
    pub(crate) fn dispose<H: Host>(&mut self, host: &mut H) {
        for segment in self.queue.drain(..) {
            host.free_resource(segment.resource_id);
        }
        self.sink.dispose(host);
    }

    fn update_target_duration(&mut self, duration: f64) {
        let reference = self
            .last_duration
            .map_or(duration, |last| f64::max(last, duration));
        self.last_duration = Some(duration);
        self.target_duration = round_centiseconds(f64::max(
            self.policy.min_seconds,
            self.policy.min_segments as f64 * self.policy.safety_margin * reference,
        ));
    }
}

fn round_centiseconds(val: f64) -> f64 {
    (val * 100.).round() / 100.
}
