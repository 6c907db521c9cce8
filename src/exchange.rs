// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Single-shot queries against one authoritative server

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::net::UdpSocket;

use crate::error::{Error, ErrorKind};
use crate::proto::op::{Message, MessageType, OpCode, Query};
use crate::proto::rr::{Name, RecordType};

/// Largest UDP payload the resolver will accept.
const MAX_RESPONSE_SIZE: usize = 4096;

const DNS_PORT: u16 = 53;

/// Sends one non-recursive query for `(qname, qtype)` to `server` over
/// UDP and decodes the reply.
///
/// The whole round trip — socket setup, send, receive, decode — shares a
/// single deadline. Timeouts, I/O failures, and malformed responses all
/// surface as the same opaque [`Error`]; the engine treats every failure
/// identically and moves on to the next address.
pub(crate) async fn exchange(
    server: Ipv4Addr,
    qname: &Name,
    qtype: RecordType,
    timeout: Duration,
) -> Result<Message, Error> {
    let mut query = Message::new();
    query
        .set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(false)
        .add_query(Query::query(qname.clone(), qtype));
    let encoded = query.to_vec()?;

    let round_trip = async {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect((server, DNS_PORT)).await?;
        socket.send(&encoded).await?;

        let mut buf = [0_u8; MAX_RESPONSE_SIZE];
        let len = socket.recv(&mut buf).await?;
        Ok::<_, Error>(Message::from_vec(&buf[..len])?)
    };

    let response = match tokio::time::timeout(timeout, round_trip).await {
        Ok(response) => response?,
        Err(_) => return Err(ErrorKind::Timeout.into()),
    };

    if response.id() != query.id() {
        return Err(ErrorKind::Message("response id does not match query").into());
    }

    Ok(response)
}
