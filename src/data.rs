/*!
The protobuf wire format for envelopes.

Events are mapped onto the dropsonde messages in [`proto`] and encoded with `prost`.
*/

pub(crate) mod proto;

use prost::Message;

use crate::{
    envelope::Envelope,
    event::{
        ContainerMetric, CounterEvent, Event, Heartbeat, HttpStart, HttpStop, LogMessage, Uuid,
        ValueMetric,
    },
};

pub(crate) fn encode_envelope(envelope: &Envelope) -> Vec<u8> {
    to_message(envelope).encode_to_vec()
}

fn to_message(envelope: &Envelope) -> proto::Envelope {
    let mut message = proto::Envelope {
        origin: envelope.origin().to_owned(),
        event_type: envelope.event_type() as i32,
        timestamp: envelope.timestamp(),
        deployment: envelope.deployment().to_owned(),
        job: envelope.job().to_owned(),
        index: envelope.index().to_owned(),
        ip: envelope.ip().to_string(),
        ..Default::default()
    };

    match envelope.event() {
        Event::Heartbeat(evt) => message.heartbeat = Some(heartbeat(evt)),
        Event::HttpStart(evt) => message.http_start = Some(http_start(evt)),
        Event::HttpStop(evt) => message.http_stop = Some(http_stop(evt)),
        Event::LogMessage(evt) => message.log_message = Some(log_message(evt)),
        Event::ValueMetric(evt) => message.value_metric = Some(value_metric(evt)),
        Event::CounterEvent(evt) => message.counter_event = Some(counter_event(evt)),
        Event::ContainerMetric(evt) => message.container_metric = Some(container_metric(evt)),
    }

    message
}

fn uuid_message(id: &Uuid) -> proto::Uuid {
    proto::Uuid {
        low: id.low,
        high: id.high,
    }
}

fn heartbeat(evt: &Heartbeat) -> proto::Heartbeat {
    proto::Heartbeat {
        sent_count: evt.sent_count,
        received_count: evt.received_count,
        error_count: evt.error_count,
    }
}

fn http_start(evt: &HttpStart) -> proto::HttpStart {
    proto::HttpStart {
        timestamp: evt.timestamp,
        request_id: Some(uuid_message(&evt.request_id)),
        peer_type: evt.peer_type as i32,
        method: evt.method.map(|method| method as i32),
        uri: evt.uri.clone(),
        remote_address: evt.remote_address.clone(),
        user_agent: evt.user_agent.clone(),
        parent_request_id: evt.parent_request_id.as_ref().map(uuid_message),
        application_id: evt.application_id.as_ref().map(uuid_message),
        instance_index: evt.instance_index,
        instance_id: evt.instance_id.clone(),
    }
}

fn http_stop(evt: &HttpStop) -> proto::HttpStop {
    proto::HttpStop {
        timestamp: evt.timestamp,
        uri: evt.uri.clone(),
        request_id: Some(uuid_message(&evt.request_id)),
        peer_type: evt.peer_type as i32,
        status_code: evt.status_code,
        content_length: evt.content_length,
        application_id: evt.application_id.as_ref().map(uuid_message),
    }
}

fn value_metric(evt: &ValueMetric) -> proto::ValueMetric {
    proto::ValueMetric {
        name: evt.name.clone(),
        value: evt.value,
        unit: evt.unit.clone(),
    }
}

fn counter_event(evt: &CounterEvent) -> proto::CounterEvent {
    proto::CounterEvent {
        name: evt.name.clone(),
        delta: evt.delta,
        total: evt.total,
    }
}

fn log_message(evt: &LogMessage) -> proto::LogMessage {
    proto::LogMessage {
        message: evt.message.clone(),
        message_type: evt.message_type as i32,
        timestamp: evt.timestamp,
        app_id: evt.app_id.clone(),
        source_type: evt.source_type.clone(),
        source_instance: evt.source_instance.clone(),
    }
}

fn container_metric(evt: &ContainerMetric) -> proto::ContainerMetric {
    proto::ContainerMetric {
        application_id: evt.application_id.clone(),
        instance_index: evt.instance_index,
        cpu_percentage: evt.cpu_percentage,
        memory_bytes: evt.memory_bytes,
        disk_bytes: evt.disk_bytes,
    }
}
