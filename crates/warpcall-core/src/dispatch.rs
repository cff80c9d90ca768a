//! The dispatch seam between the façade and the compiler/runtime.

use parking_lot::Mutex;

use crate::error::Result;
use crate::intrinsic::{InternalCall, WarpIntrinsic};

/// Executes or lowers warp intrinsics.
///
/// Implemented by whatever owns the real semantics: a code generator that
/// emits the instruction, or an emulator that computes it. Each façade
/// operation results in exactly one `dispatch` call.
pub trait IntrinsicDispatcher {
    /// Per-lane value representation.
    type Value;

    /// Handle one intrinsic.
    ///
    /// Returns `Some` for value-producing intrinsics and `None` for the barrier.
    fn dispatch(&self, intrinsic: WarpIntrinsic<Self::Value>) -> Result<Option<Self::Value>>;
}

impl<D: IntrinsicDispatcher + ?Sized> IntrinsicDispatcher for Box<D> {
    type Value = D::Value;

    fn dispatch(&self, intrinsic: WarpIntrinsic<Self::Value>) -> Result<Option<Self::Value>> {
        (**self).dispatch(intrinsic)
    }
}

/// Dispatcher that records lowered calls and answers with a fixed value.
///
/// Useful wherever the flat call stream itself is the product, for example
/// when checking what a kernel body asks the backend to emit.
#[derive(Debug)]
pub struct RecordingDispatcher<V> {
    calls: Mutex<Vec<InternalCall<V>>>,
    response: V,
}

impl<V: Clone + Default> Default for RecordingDispatcher<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: Clone> RecordingDispatcher<V> {
    /// Create a recorder that returns `response` for every value-producing call.
    pub fn new(response: V) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response,
        }
    }

    /// Snapshot of the recorded calls, in dispatch order.
    pub fn calls(&self) -> Vec<InternalCall<V>> {
        self.calls.lock().clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<InternalCall<V>> {
        std::mem::take(&mut *self.calls.lock())
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether nothing has been dispatched.
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

impl<V: Clone> IntrinsicDispatcher for RecordingDispatcher<V> {
    type Value = V;

    fn dispatch(&self, intrinsic: WarpIntrinsic<V>) -> Result<Option<V>> {
        let returns_value = intrinsic.id().returns_value();
        self.calls.lock().push(intrinsic.lower());
        Ok(returns_value.then(|| self.response.clone()))
    }
}
