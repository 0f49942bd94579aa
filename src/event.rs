/*!
The closed set of events that can be carried by an [`crate::Envelope`].

Each variant of [`Event`] wraps a plain data struct. The mapping from variant to wire tag is [`Event::event_type`].
*/

use std::{fmt, str::FromStr};

use crate::platform;

/**
Request header carrying a correlation id for HTTP start/stop pairs.
*/
pub const HEADER_REQUEST_ID: &str = "X-CF-RequestID";

/**
Request header carrying the id of the application serving a request.
*/
pub const HEADER_APPLICATION_ID: &str = "X-CF-ApplicationID";

/**
Request header carrying the instance index of the application serving a request.
*/
pub const HEADER_INSTANCE_INDEX: &str = "X-CF-InstanceIndex";

/**
An event that can be wrapped in an envelope.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /**
    The start of an HTTP request.
    */
    HttpStart(HttpStart),
    /**
    The end of an HTTP request.
    */
    HttpStop(HttpStop),
    /**
    A named sample of a value.
    */
    ValueMetric(ValueMetric),
    /**
    An increment of a named counter.
    */
    CounterEvent(CounterEvent),
    /**
    A line of application output.
    */
    LogMessage(LogMessage),
    /**
    Resource usage of an application container.
    */
    ContainerMetric(ContainerMetric),
    /**
    An emitter reporting its own sent, received and error counts.
    */
    Heartbeat(Heartbeat),
}

impl Event {
    /**
    The wire tag for this event's variant.
    */
    pub fn event_type(&self) -> EventType {
        match self {
            Event::HttpStart(_) => EventType::HttpStart,
            Event::HttpStop(_) => EventType::HttpStop,
            Event::ValueMetric(_) => EventType::ValueMetric,
            Event::CounterEvent(_) => EventType::CounterEvent,
            Event::LogMessage(_) => EventType::LogMessage,
            Event::ContainerMetric(_) => EventType::ContainerMetric,
            Event::Heartbeat(_) => EventType::Heartbeat,
        }
    }
}

/**
The tag identifying which variant an envelope carries.

Discriminants are the wire values.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EventType {
    /**
    [`Event::Heartbeat`].
    */
    Heartbeat = 1,
    /**
    [`Event::HttpStart`].
    */
    HttpStart = 2,
    /**
    [`Event::HttpStop`].
    */
    HttpStop = 3,
    /**
    [`Event::LogMessage`].
    */
    LogMessage = 5,
    /**
    [`Event::ValueMetric`].
    */
    ValueMetric = 6,
    /**
    [`Event::CounterEvent`].
    */
    CounterEvent = 7,
    /**
    [`Event::ContainerMetric`].
    */
    ContainerMetric = 9,
}

impl EventType {
    /**
    All event types, in wire order.
    */
    pub const ALL: [EventType; 7] = [
        EventType::Heartbeat,
        EventType::HttpStart,
        EventType::HttpStop,
        EventType::LogMessage,
        EventType::ValueMetric,
        EventType::CounterEvent,
        EventType::ContainerMetric,
    ];

    /**
    Get the event type for a wire value.
    */
    pub fn from_i32(value: i32) -> Option<EventType> {
        EventType::ALL
            .into_iter()
            .find(|event_type| *event_type as i32 == value)
    }
}

/**
A value that can be converted into an [`Event`].

A value that returns `None` has no envelope representation, and wrapping it fails with [`crate::ErrorKind::UnknownEventType`].
*/
pub trait ToEvent {
    /**
    Convert this value into an event, if it has a representation.
    */
    fn to_event(self) -> Option<Event>;
}

impl ToEvent for Event {
    fn to_event(self) -> Option<Event> {
        Some(self)
    }
}

impl<T: ToEvent> ToEvent for Option<T> {
    fn to_event(self) -> Option<Event> {
        self.and_then(ToEvent::to_event)
    }
}

macro_rules! variants {
    ($($variant:ident,)*) => {
        $(
            impl From<$variant> for Event {
                fn from(evt: $variant) -> Event {
                    Event::$variant(evt)
                }
            }

            impl ToEvent for $variant {
                fn to_event(self) -> Option<Event> {
                    Some(Event::$variant(self))
                }
            }
        )*
    };
}

variants!(
    HttpStart,
    HttpStop,
    ValueMetric,
    CounterEvent,
    LogMessage,
    ContainerMetric,
    Heartbeat,
);

/**
A 128bit identifier split into two little-endian halves.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid {
    /**
    The first 8 bytes, read as a little-endian integer.
    */
    pub low: u64,
    /**
    The last 8 bytes, read as a little-endian integer.
    */
    pub high: u64,
}

impl Uuid {
    /**
    Create an identifier from its 16 bytes.
    */
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut low = [0; 8];
        let mut high = [0; 8];

        low.copy_from_slice(&bytes[..8]);
        high.copy_from_slice(&bytes[8..]);

        Uuid {
            low: u64::from_le_bytes(low),
            high: u64::from_le_bytes(high),
        }
    }

    /**
    Get the 16 bytes of this identifier.
    */
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0; 16];

        bytes[..8].copy_from_slice(&self.low.to_le_bytes());
        bytes[8..].copy_from_slice(&self.high.to_le_bytes());

        bytes
    }

    /**
    Generate a random (version 4) identifier.
    */
    pub fn new_v4() -> Self {
        Uuid::from(uuid::Uuid::new_v4())
    }

    fn to_uuid(&self) -> uuid::Uuid {
        uuid::Uuid::from_bytes(self.to_bytes())
    }
}

impl From<uuid::Uuid> for Uuid {
    fn from(id: uuid::Uuid) -> Self {
        Uuid::from_bytes(*id.as_bytes())
    }
}

impl From<Uuid> for uuid::Uuid {
    fn from(id: Uuid) -> Self {
        id.to_uuid()
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_uuid().hyphenated(), f)
    }
}

/**
An error parsing a [`Uuid`] from text.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseUuidError(uuid::Error);

impl fmt::Display for ParseUuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ParseUuidError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Uuid {
    type Err = ParseUuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Uuid::from).map_err(ParseUuidError)
    }
}

/**
Which side of an HTTP exchange observed the request.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PeerType {
    /**
    The request was sent by this process.
    */
    Client = 1,
    /**
    The request was served by this process.
    */
    Server = 2,
}

/**
An HTTP request method.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Method {
    /**
    `GET`.
    */
    Get = 1,
    /**
    `POST`.
    */
    Post = 2,
    /**
    `PUT`.
    */
    Put = 3,
    /**
    `DELETE`.
    */
    Delete = 4,
    /**
    `HEAD`.
    */
    Head = 5,
}

impl Method {
    /**
    Parse an HTTP method name, like `GET`.

    Method names are case-sensitive.
    */
    pub fn parse(method: &str) -> Option<Method> {
        match method {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            _ => None,
        }
    }
}

/**
The stream a [`LogMessage`] was written to.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageType {
    /**
    Standard output.
    */
    Out = 1,
    /**
    Standard error.
    */
    Err = 2,
}

/**
The start of an HTTP request.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStart {
    /**
    When the request started, in nanoseconds since the unix epoch.
    */
    pub timestamp: i64,
    /**
    The correlation id shared with the matching [`HttpStop`].
    */
    pub request_id: Uuid,
    /**
    Which side of the exchange observed the request.
    */
    pub peer_type: PeerType,
    /**
    The request method, if it's one of the known methods.
    */
    pub method: Option<Method>,
    /**
    The host and path of the request.
    */
    pub uri: String,
    /**
    The address of the remote peer.
    */
    pub remote_address: String,
    /**
    The user agent of the client.
    */
    pub user_agent: String,
    /**
    The request that caused this one, if any.
    */
    pub parent_request_id: Option<Uuid>,
    /**
    The application serving the request, if known.
    */
    pub application_id: Option<Uuid>,
    /**
    The instance index of the application serving the request, if known.
    */
    pub instance_index: Option<i32>,
    /**
    The instance id of the application serving the request, if known.
    */
    pub instance_id: Option<String>,
}

impl HttpStart {
    /**
    Start a request observed now.
    */
    pub fn new(
        peer_type: PeerType,
        method: &str,
        uri: impl Into<String>,
        remote_address: impl Into<String>,
        user_agent: impl Into<String>,
        request_id: Uuid,
    ) -> Self {
        HttpStart {
            timestamp: platform::unix_nanos().unwrap_or_default(),
            request_id,
            peer_type,
            method: Method::parse(method),
            uri: uri.into(),
            remote_address: remote_address.into(),
            user_agent: user_agent.into(),
            parent_request_id: None,
            application_id: None,
            instance_index: None,
            instance_id: None,
        }
    }

    /**
    Set the application id from the value of a [`HEADER_APPLICATION_ID`] header.

    Values that aren't valid uuids are ignored.
    */
    pub fn with_application_id(mut self, header: &str) -> Self {
        if let Ok(application_id) = header.parse() {
            self.application_id = Some(application_id);
        }

        self
    }

    /**
    Set the instance index from the value of a [`HEADER_INSTANCE_INDEX`] header.

    Values that aren't valid integers are ignored.
    */
    pub fn with_instance_index(mut self, header: &str) -> Self {
        if let Ok(instance_index) = header.trim().parse() {
            self.instance_index = Some(instance_index);
        }

        self
    }
}

/**
The end of an HTTP request.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStop {
    /**
    When the request completed, in nanoseconds since the unix epoch.
    */
    pub timestamp: i64,
    /**
    The host and path of the request.
    */
    pub uri: String,
    /**
    The correlation id shared with the matching [`HttpStart`].
    */
    pub request_id: Uuid,
    /**
    Which side of the exchange observed the request.
    */
    pub peer_type: PeerType,
    /**
    The response status code.
    */
    pub status_code: i32,
    /**
    The length of the response body in bytes.
    */
    pub content_length: i64,
    /**
    The application serving the request, if known.
    */
    pub application_id: Option<Uuid>,
}

impl HttpStop {
    /**
    Complete a request observed now.
    */
    pub fn new(
        uri: impl Into<String>,
        status_code: i32,
        content_length: i64,
        peer_type: PeerType,
        request_id: Uuid,
    ) -> Self {
        HttpStop {
            timestamp: platform::unix_nanos().unwrap_or_default(),
            uri: uri.into(),
            request_id,
            peer_type,
            status_code,
            content_length,
            application_id: None,
        }
    }
}

/**
A named sample of a value.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMetric {
    /**
    The name of the metric.
    */
    pub name: String,
    /**
    The sampled value.
    */
    pub value: f64,
    /**
    The unit of the value, like `ms` or `bytes`.
    */
    pub unit: String,
}

impl ValueMetric {
    /**
    Create a new value sample.
    */
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        ValueMetric {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }
}

/**
An increment of a named counter.

Counters carry deltas. Any running total is kept by the receiver.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEvent {
    /**
    The name of the counter.
    */
    pub name: String,
    /**
    The amount to add to the counter.
    */
    pub delta: u64,
    /**
    The running total of the counter, if the sender tracks one.
    */
    pub total: Option<u64>,
}

impl CounterEvent {
    /**
    Create a new counter increment.
    */
    pub fn new(name: impl Into<String>, delta: u64) -> Self {
        CounterEvent {
            name: name.into(),
            delta,
            total: None,
        }
    }
}

/**
A line of application output.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /**
    The raw bytes of the line.
    */
    pub message: Vec<u8>,
    /**
    The stream the line was written to.
    */
    pub message_type: MessageType,
    /**
    When the line was written, in nanoseconds since the unix epoch.
    */
    pub timestamp: i64,
    /**
    The application that wrote the line.
    */
    pub app_id: String,
    /**
    The kind of process that wrote the line.
    */
    pub source_type: String,
    /**
    The instance of the process that wrote the line.
    */
    pub source_instance: String,
}

impl LogMessage {
    /**
    Create a log line written now.
    */
    pub fn new(
        app_id: impl Into<String>,
        message: impl Into<Vec<u8>>,
        message_type: MessageType,
        source_type: impl Into<String>,
        source_instance: impl Into<String>,
    ) -> Self {
        LogMessage {
            message: message.into(),
            message_type,
            timestamp: platform::unix_nanos().unwrap_or_default(),
            app_id: app_id.into(),
            source_type: source_type.into(),
            source_instance: source_instance.into(),
        }
    }
}

/**
Resource usage of an application container.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerMetric {
    /**
    The application running in the container.
    */
    pub application_id: String,
    /**
    The instance index of the application.
    */
    pub instance_index: i32,
    /**
    CPU usage as a percentage of one core.
    */
    pub cpu_percentage: f64,
    /**
    Memory used, in bytes.
    */
    pub memory_bytes: u64,
    /**
    Disk used, in bytes.
    */
    pub disk_bytes: u64,
}

/**
An emitter reporting its own counts.

At any observation that follows a completed emit, `received_count == sent_count + error_count`.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heartbeat {
    /**
    Events successfully handed to the transport.
    */
    pub sent_count: u64,
    /**
    Events given to the emitter.
    */
    pub received_count: u64,
    /**
    Events the transport failed to send.
    */
    pub error_count: u64,
}

impl Heartbeat {
    /**
    Create a heartbeat from a set of counts.
    */
    pub fn new(sent_count: u64, received_count: u64, error_count: u64) -> Self {
        Heartbeat {
            sent_count,
            received_count,
            error_count,
        }
    }
}
