#![no_std]
#![forbid(unsafe_code)]

//! # UDC Serial
//!
//! Turns an asynchronously arriving byte stream into frames using silence
//! alone: a pause longer than 3.5 character times at the configured baud rate
//! ends a frame. Frame contents are never interpreted.
//!
//! A link is split along the interrupt boundary. The receive interrupt owns
//! an [`RxPath`] and pushes bytes into the producer end of a [`ByteQueue`];
//! the main loop owns the [`SerialLink`] holding the consumer end, the
//! transmit queue and the transceiver. Both share one [`LinkStatus`].
//!
//! ```ignore
//! static STATUS: LinkStatus = LinkStatus::new();
//! let mut queue: ByteQueue<RX_QUEUE_SIZE> = ByteQueue::new();
//! let (producer, consumer) = queue.split();
//! let rx = RxPath::new(producer, &STATUS);           // to the UART interrupt
//! let mut link: SerialLink<_, _, RX_QUEUE_SIZE, TX_QUEUE_SIZE> =
//!     SerialLink::new(consumer, &STATUS, &clock, uart, LinkConfig::rtu(19_200))?;
//! let mut frame = [0u8; 256];
//! let len = link.receive_frame(&mut frame, 1_000)?;
//! ```

pub mod config;
pub mod link;
pub mod queue;
pub mod rx;
pub mod status;
pub mod timing;

pub use config::{LinkConfig, RX_QUEUE_SIZE, TX_QUEUE_SIZE};
pub use link::{LinkDiagnostics, SerialLink};
pub use queue::{ByteConsumer, ByteProducer, ByteQueue};
pub use rx::RxPath;
pub use status::{LinkStatus, StatusFlags, FRAME_MARKS};
pub use timing::SerialTiming;
