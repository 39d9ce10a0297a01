//! NETLINK transport: raw `AF_NETLINK`/`NETLINK_AUDIT` socket I/O built
//! directly on `libc`.

mod netlink;

pub use netlink::{decode_frame, NetlinkTransport, RawFrame};
