// Messages use proto2 labels: `required` fields are always written, even when zero,
// and `optional` fields are written whenever they're `Some`.

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Envelope {
    #[prost(string, required, tag = "1")]
    pub origin: String,
    #[prost(int32, required, tag = "2")]
    pub event_type: i32,
    #[prost(message, optional, tag = "3")]
    pub heartbeat: Option<Heartbeat>,
    #[prost(message, optional, tag = "4")]
    pub http_start: Option<HttpStart>,
    #[prost(message, optional, tag = "5")]
    pub http_stop: Option<HttpStop>,
    #[prost(int64, required, tag = "6")]
    pub timestamp: i64,
    #[prost(message, optional, tag = "8")]
    pub log_message: Option<LogMessage>,
    #[prost(message, optional, tag = "9")]
    pub value_metric: Option<ValueMetric>,
    #[prost(message, optional, tag = "10")]
    pub counter_event: Option<CounterEvent>,
    #[prost(message, optional, tag = "12")]
    pub container_metric: Option<ContainerMetric>,
    #[prost(string, required, tag = "13")]
    pub deployment: String,
    #[prost(string, required, tag = "14")]
    pub job: String,
    #[prost(string, required, tag = "15")]
    pub index: String,
    #[prost(string, required, tag = "16")]
    pub ip: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Uuid {
    #[prost(uint64, required, tag = "1")]
    pub low: u64,
    #[prost(uint64, required, tag = "2")]
    pub high: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct Heartbeat {
    #[prost(uint64, required, tag = "1")]
    pub sent_count: u64,
    #[prost(uint64, required, tag = "2")]
    pub received_count: u64,
    #[prost(uint64, required, tag = "3")]
    pub error_count: u64,
}

// Required message fields are still `Option`s, but are always `Some` when encoded.
#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct HttpStart {
    #[prost(int64, required, tag = "1")]
    pub timestamp: i64,
    #[prost(message, optional, tag = "2")]
    pub request_id: Option<Uuid>,
    #[prost(int32, required, tag = "3")]
    pub peer_type: i32,
    #[prost(int32, optional, tag = "4")]
    pub method: Option<i32>,
    #[prost(string, required, tag = "5")]
    pub uri: String,
    #[prost(string, required, tag = "6")]
    pub remote_address: String,
    #[prost(string, required, tag = "7")]
    pub user_agent: String,
    #[prost(message, optional, tag = "8")]
    pub parent_request_id: Option<Uuid>,
    #[prost(message, optional, tag = "9")]
    pub application_id: Option<Uuid>,
    #[prost(int32, optional, tag = "10")]
    pub instance_index: Option<i32>,
    #[prost(string, optional, tag = "11")]
    pub instance_id: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct HttpStop {
    #[prost(int64, required, tag = "1")]
    pub timestamp: i64,
    #[prost(string, required, tag = "2")]
    pub uri: String,
    #[prost(message, optional, tag = "3")]
    pub request_id: Option<Uuid>,
    #[prost(int32, required, tag = "4")]
    pub peer_type: i32,
    #[prost(int32, required, tag = "5")]
    pub status_code: i32,
    #[prost(int64, required, tag = "6")]
    pub content_length: i64,
    #[prost(message, optional, tag = "7")]
    pub application_id: Option<Uuid>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct ValueMetric {
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(double, required, tag = "2")]
    pub value: f64,
    #[prost(string, required, tag = "3")]
    pub unit: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct CounterEvent {
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(uint64, required, tag = "2")]
    pub delta: u64,
    #[prost(uint64, optional, tag = "3")]
    pub total: Option<u64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct LogMessage {
    #[prost(bytes = "vec", required, tag = "1")]
    pub message: Vec<u8>,
    #[prost(int32, required, tag = "2")]
    pub message_type: i32,
    #[prost(int64, required, tag = "3")]
    pub timestamp: i64,
    #[prost(string, required, tag = "4")]
    pub app_id: String,
    #[prost(string, required, tag = "5")]
    pub source_type: String,
    #[prost(string, required, tag = "6")]
    pub source_instance: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct ContainerMetric {
    #[prost(string, required, tag = "1")]
    pub application_id: String,
    #[prost(int32, required, tag = "2")]
    pub instance_index: i32,
    #[prost(double, required, tag = "3")]
    pub cpu_percentage: f64,
    #[prost(uint64, required, tag = "4")]
    pub memory_bytes: u64,
    #[prost(uint64, required, tag = "5")]
    pub disk_bytes: u64,
}
