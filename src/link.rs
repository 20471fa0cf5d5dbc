use core::sync::atomic::{AtomicBool, Ordering};
use usb_device::Result;

use crate::control::ControlState;
use crate::ring::{Producer, RingBuffer};

/// Default receive buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Single-bit "last send complete" signal, set from the driver's transmit-complete interrupt and
/// cleared by the client.
pub(crate) struct Completion(AtomicBool);

impl Completion {
    pub const fn new() -> Self {
        Completion(AtomicBool::new(false))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// State shared between the driver's interrupt context and a [`Transport`](crate::Transport).
///
/// Holds the receive ring buffer, the transmit completion flag and the CDC control state. It is
/// meant to be placed in a `static` so interrupt handlers can reach it:
///
/// ```
/// use usbd_serial_transport::{Link, DEFAULT_CAPACITY};
///
/// static LINK: Link<DEFAULT_CAPACITY> = Link::new();
///
/// let endpoint = LINK.split().unwrap();
/// assert!(LINK.split().is_none());
/// # drop(endpoint);
/// ```
pub struct Link<const N: usize> {
    rx: RingBuffer<N>,
    tx: Completion,
    control: ControlState,
    claimed: AtomicBool,
}

impl<const N: usize> Link<N> {
    pub const fn new() -> Self {
        Link {
            rx: RingBuffer::new(),
            tx: Completion::new(),
            control: ControlState::new(),
            claimed: AtomicBool::new(false),
        }
    }

    /// Claims the link for a single [`Transport`](crate::Transport). Returns `None` if the link was
    /// already claimed; a link is never released, so this succeeds once per link.
    pub fn split(&self) -> Option<Endpoint<'_, N>> {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Endpoint { link: self })
    }

    /// Gets the receive buffer.
    pub fn rx(&self) -> &RingBuffer<N> {
        &self.rx
    }

    pub(crate) fn completion(&self) -> &Completion {
        &self.tx
    }

    pub(crate) fn control(&self) -> &ControlState {
        &self.control
    }
}

impl<const N: usize> Default for Link<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive claim on a [`Link`], handed out once by [`Link::split`] and consumed by
/// [`Transport::new`](crate::Transport::new). Holding it is what makes the transport the only
/// consumer of the ring buffer and the only one to register a producer with the driver.
pub struct Endpoint<'a, const N: usize> {
    link: &'a Link<N>,
}

impl<'a, const N: usize> Endpoint<'a, N> {
    pub(crate) fn link(&self) -> &'a Link<N> {
        self.link
    }

    // The transport calls this once, so there is a single producer.
    pub(crate) fn hooks(&self) -> Hooks<'a> {
        let link = self.link;
        Hooks {
            rx: link.rx.producer(),
            tx: &link.tx,
            control: &link.control,
        }
    }
}

/// Callback table registered with the driver when the transport is opened.
///
/// All methods are safe to call from interrupt context: none of them block or allocate. The driver
/// must call them from one context at a time.
pub struct Hooks<'a> {
    rx: Producer<'a>,
    tx: &'a Completion,
    control: &'a ControlState,
}

impl Hooks<'_> {
    /// Stores a chunk of received bytes and then re-arms the driver through `rearm` before
    /// returning. Returns the number of bytes accepted; the rest was dropped as overrun.
    pub fn receive(&self, chunk: &[u8], rearm: impl FnOnce()) -> usize {
        let accepted = self.rx.deliver(chunk);
        rearm();
        accepted
    }

    /// Signals that the last send finished.
    pub fn transmit_complete(&self) {
        self.tx.signal();
    }

    /// Handles a CDC-ACM class control request. See [`crate::control`] for the request codes.
    pub fn control(&self, request: u8, value: u16, data: &mut [u8]) -> Result<usize> {
        self.control.handle(request, value, data)
    }
}

/// The hardware side of the transport: a USB CDC device driver with interrupt callbacks.
pub trait CdcDriver<'a> {
    /// Installs the callback table. Called once, on the first
    /// [`Transport::open`](crate::Transport::open).
    fn register(&mut self, hooks: Hooks<'a>);

    /// Starts sending `data`. An error means the transmission was refused right away; otherwise
    /// the driver calls [`Hooks::transmit_complete`] once the data is gone.
    fn send(&mut self, data: &[u8]) -> Result<()>;
}
