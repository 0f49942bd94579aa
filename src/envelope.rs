/*!
Wrap events in self-describing envelopes.

An [`Envelope`] carries exactly one [`Event`] along with the identity of the process that emitted it, the address it was emitted from, and when it was wrapped.
*/

use std::net::IpAddr;

use crate::{
    data,
    event::{Event, EventType, ToEvent},
    platform, Error, ErrorKind,
};

/**
The identity of an emitting process.

All four fields must be non-empty for an event to be wrapped.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /**
    The name of the emitting process or job, used to attribute events.
    */
    pub origin: String,
    /**
    The deployment the process belongs to.
    */
    pub deployment: String,
    /**
    The job the process belongs to.
    */
    pub job: String,
    /**
    The index of the process within its job.
    */
    pub index: String,
}

impl Identity {
    /**
    Create an identity from its parts.
    */
    pub fn new(
        origin: impl Into<String>,
        deployment: impl Into<String>,
        job: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Identity {
            origin: origin.into(),
            deployment: deployment.into(),
            job: job.into(),
            index: index.into(),
        }
    }

    /**
    Check that every field is present.

    Fields are checked in the order origin, deployment, job, index, and the first empty one determines the error.
    */
    pub fn validate(&self) -> Result<(), Error> {
        let checks = [
            (&self.origin, ErrorKind::MissingOrigin),
            (&self.deployment, ErrorKind::MissingDeployment),
            (&self.job, ErrorKind::MissingJob),
            (&self.index, ErrorKind::MissingIndex),
        ];

        for (field, kind) in checks {
            if field.is_empty() {
                return Err(Error::new(kind));
            }
        }

        Ok(())
    }
}

/**
An event along with the metadata needed to attribute it.
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    origin: String,
    deployment: String,
    job: String,
    index: String,
    ip: IpAddr,
    timestamp: i64,
    event: Event,
}

impl Envelope {
    /**
    The name of the emitting process.
    */
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /**
    The deployment of the emitting process.
    */
    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /**
    The job of the emitting process.
    */
    pub fn job(&self) -> &str {
        &self.job
    }

    /**
    The index of the emitting process within its job.
    */
    pub fn index(&self) -> &str {
        &self.index
    }

    /**
    The address the event was emitted from.
    */
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /**
    When the event was wrapped, in nanoseconds since the unix epoch.
    */
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /**
    The tag of the carried event.

    This is always derived from [`Envelope::event`], so the two can't disagree.
    */
    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }

    /**
    The carried event.
    */
    pub fn event(&self) -> &Event {
        &self.event
    }

    /**
    Take the carried event.
    */
    pub fn into_event(self) -> Event {
        self.event
    }

    /**
    Marshal this envelope into its binary wire format.
    */
    pub fn to_protobuf(&self) -> Vec<u8> {
        data::encode_envelope(self)
    }
}

/**
Wrap an event in an envelope.

Identity fields are validated first, then the local address and timestamp are resolved, then the event is converted. No envelope is returned if any step fails.
*/
pub fn wrap(evt: impl ToEvent, identity: &Identity) -> Result<Envelope, Error> {
    identity.validate()?;

    let ip = platform::local_ip()?;
    let timestamp = platform::unix_nanos()?;

    let event = evt
        .to_event()
        .ok_or_else(|| Error::new(ErrorKind::UnknownEventType))?;

    Ok(Envelope {
        origin: identity.origin.clone(),
        deployment: identity.deployment.clone(),
        job: identity.job.clone(),
        index: identity.index.clone(),
        ip,
        timestamp,
        event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::event::{CounterEvent, Heartbeat, HttpStop, PeerType, Uuid};

    fn identity() -> Identity {
        Identity::new("job/0", "cf", "router", "0")
    }

    #[test]
    fn wrap_sets_identity_and_tag() {
        let stop = HttpStop::new("example.com/", 200, 3, PeerType::Client, Uuid::new_v4());

        let envelope = wrap(stop.clone(), &identity()).unwrap();

        assert_eq!("job/0", envelope.origin());
        assert_eq!("cf", envelope.deployment());
        assert_eq!("router", envelope.job());
        assert_eq!("0", envelope.index());
        assert_eq!(EventType::HttpStop, envelope.event_type());
        assert_eq!(&Event::HttpStop(stop), envelope.event());
        assert!(envelope.timestamp() > 0);
    }

    #[test]
    fn wrap_missing_fields() {
        let cases = [
            (Identity::new("", "cf", "router", "0"), ErrorKind::MissingOrigin),
            (Identity::new("o", "", "router", "0"), ErrorKind::MissingDeployment),
            (Identity::new("o", "cf", "", "0"), ErrorKind::MissingJob),
            (Identity::new("o", "cf", "router", ""), ErrorKind::MissingIndex),
        ];

        for (identity, kind) in cases {
            let err = wrap(CounterEvent::new("x", 1), &identity).unwrap_err();

            assert_eq!(kind, err.kind(), "{:?}", identity);
        }
    }

    #[test]
    fn wrap_checks_origin_first() {
        let identity = Identity::new("", "cf", "", "");

        let err = wrap(Heartbeat::default(), &identity).unwrap_err();

        assert_eq!(ErrorKind::MissingOrigin, err.kind());
    }

    #[test]
    fn wrap_checks_job_before_index() {
        let identity = Identity::new("o", "cf", "", "");

        let err = wrap(Heartbeat::default(), &identity).unwrap_err();

        assert_eq!(ErrorKind::MissingJob, err.kind());
    }

    #[test]
    fn wrap_unknown_event() {
        let err = wrap(None::<Event>, &identity()).unwrap_err();

        assert_eq!(ErrorKind::UnknownEventType, err.kind());
    }

    #[test]
    fn wrap_does_not_mutate_event() {
        let counter = CounterEvent::new("x", 7);

        let envelope = wrap(counter.clone(), &identity()).unwrap();

        assert_eq!(Event::CounterEvent(counter), envelope.into_event());
    }
}
