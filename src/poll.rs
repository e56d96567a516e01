//! The "awaiting post" poll loop.
//!
//! While the server is still federating a post, it renders an anchor into the widget whose `delay`
//! query parameter tells how long the client waited last time. Each patch that still contains the
//! anchor stretches the delay and schedules another click on it.

use crate::{submission::set_query_pair, Error, Widget};
use gloo_timers::callback::Timeout;
use serde::Deserialize;
use tracing::{info, instrument, trace};
use url::Url;
use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

/// Query parameter carrying the last delay, in milliseconds.
pub const DELAY_PARAMETER: &str = "delay";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PollPolicy {
	/// Assumed previous delay when the anchor carries none.
	pub initial_delay: u32,
	pub factor: u32,
	/// Ceiling for a single delay.
	pub max_delay: u32,
	/// Stop after this many consecutive reschedules. [`None`] polls for as long as the anchor keeps showing up.
	pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
	fn default() -> Self {
		Self {
			initial_delay: 81,
			factor: 3,
			max_delay: 600_000,
			max_attempts: None,
		}
	}
}

impl PollPolicy {
	#[must_use]
	pub fn next_delay(&self, current: Option<u32>) -> u32 {
		let current = current.filter(|&delay| delay > 0).unwrap_or(self.initial_delay);
		current.saturating_mul(self.factor).min(self.max_delay)
	}

	/// Rewrites `href` with the next delay and returns it together with that delay.
	pub fn advance(&self, href: &str) -> Result<(Url, u32), Error> {
		let mut url = Url::parse(href)?;
		let current = url
			.query_pairs()
			.find(|(name, _)| name == DELAY_PARAMETER)
			.and_then(|(_, value)| value.trim().parse::<u32>().ok());
		let delay = self.next_delay(current);
		set_query_pair(&mut url, DELAY_PARAMETER, &delay.to_string());
		Ok((url, delay))
	}

	fn exhausted(&self, attempts: u32) -> bool {
		self.max_attempts.map_or(false, |max| attempts >= max)
	}
}

/// A scheduled click on the poll anchor. Dropping it cancels the click.
pub(crate) struct PollTask {
	_timeout: Timeout,
	pub(crate) delay: u32,
}

impl Widget {
	/// Looks for the poll anchor and (re)schedules it, replacing any pending poll.
	#[instrument(skip(self))]
	pub(crate) fn arm_poll(&self) -> Result<(), Error> {
		let anchor = self
			.root
			.query_selector(&self.config.poll_selector)?
			.and_then(|element| element.dyn_into::<HtmlAnchorElement>().ok());
		let anchor = match anchor {
			Some(anchor) => anchor,
			None => {
				if self.poll.borrow_mut().take().is_some() {
					trace!("Poll anchor is gone; cancelled the pending poll.");
				}
				self.poll_attempts.set(0);
				return Ok(());
			}
		};

		let attempts = self.poll_attempts.get();
		if self.config.poll.exhausted(attempts) {
			self.poll.borrow_mut().take();
			info!("Giving up polling after {} attempts.", attempts);
			return Ok(());
		}

		let (url, delay) = self.config.poll.advance(&anchor.href())?;
		anchor.set_href(url.as_str());
		self.poll_attempts.set(attempts.saturating_add(1));

		trace!("Clicking the poll anchor again in {} ms.", delay);
		let task = PollTask {
			_timeout: Timeout::new(delay, move || anchor.click()),
			delay,
		};
		*self.poll.borrow_mut() = Some(task);
		Ok(())
	}

	/// Delay of the pending poll, if one is scheduled.
	#[must_use]
	pub fn pending_poll_delay(&self) -> Option<u32> {
		self.poll.borrow().as_ref().map(|task| task.delay)
	}

	pub(crate) fn cancel_poll(&self) {
		self.poll.borrow_mut().take();
	}
}

#[cfg(test)]
mod tests {
	use super::PollPolicy;

	#[test]
	fn default_delay_is_tripled() {
		assert_eq!(PollPolicy::default().next_delay(None), 243);
	}

	#[test]
	fn delay_grows_geometrically() {
		let policy = PollPolicy::default();
		let mut delay = None;
		let mut seen = Vec::new();
		for _ in 0..4 {
			let next = policy.next_delay(delay);
			seen.push(next);
			delay = Some(next);
		}
		assert_eq!(seen, [243, 729, 2187, 6561]);
	}

	#[test]
	fn zero_counts_as_missing() {
		assert_eq!(PollPolicy::default().next_delay(Some(0)), 243);
	}

	#[test]
	fn capped_at_ceiling() {
		let policy = PollPolicy { max_delay: 1000, ..PollPolicy::default() };
		assert_eq!(policy.next_delay(Some(729)), 1000);
		assert_eq!(policy.next_delay(Some(1000)), 1000);
		assert_eq!(policy.next_delay(Some(u32::MAX)), 1000);
	}

	#[test]
	fn advance_rewrites_only_delay() {
		let (url, delay) = PollPolicy::default().advance("https://example.com/fediverse/status/?id=7&delay=243").unwrap();
		assert_eq!(delay, 729);
		assert_eq!(url.as_str(), "https://example.com/fediverse/status/?id=7&delay=729");
	}

	#[test]
	fn advance_adds_missing_delay() {
		let (url, delay) = PollPolicy::default().advance("https://example.com/status/?id=7").unwrap();
		assert_eq!(delay, 243);
		assert_eq!(url.query(), Some("id=7&delay=243"));
	}

	#[test]
	fn garbage_delay_falls_back() {
		let (_, delay) = PollPolicy::default().advance("https://example.com/?delay=soon").unwrap();
		assert_eq!(delay, 243);
	}

	#[test]
	fn attempts() {
		let policy = PollPolicy { max_attempts: Some(2), ..PollPolicy::default() };
		assert!(!policy.exhausted(1));
		assert!(policy.exhausted(2));
		assert!(!PollPolicy::default().exhausted(u32::MAX));
	}
}
