//! Optional capability hooks notified on terminal authentication failures.

// self
use crate::{_prelude::*, message::Response};

/// Observer for authentication failures that end a request.
pub trait AuthFailureListener
where
	Self: Send + Sync,
{
	/// Called with the terminal challenge response, or `None` when no token could be attached
	/// before the request was sent.
	fn on_authentication_failed(&self, response: Option<&Response>);
}
impl<F> AuthFailureListener for F
where
	F: Fn(Option<&Response>) + Send + Sync,
{
	fn on_authentication_failed(&self, response: Option<&Response>) {
		self(response)
	}
}

pub(crate) fn notify(listener: Option<&Arc<dyn AuthFailureListener>>, response: Option<&Response>) {
	if let Some(listener) = listener {
		listener.on_authentication_failed(response);
	}
}
