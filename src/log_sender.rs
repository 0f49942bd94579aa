/*!
Send application log lines through an emitter.
*/

use crate::{
    event::{LogMessage, MessageType},
    Emitter, Error,
};

/**
Sends log lines on behalf of an application through an [`Emitter`].
*/
pub struct LogSender<E> {
    emitter: E,
}

impl<E: Emitter> LogSender<E> {
    /**
    Send log lines through `emitter`.
    */
    pub fn new(emitter: E) -> Self {
        LogSender { emitter }
    }

    /**
    Send a line the application wrote to its standard output.
    */
    pub fn send_app_log(
        &self,
        app_id: &str,
        message: &str,
        source_type: &str,
        source_instance: &str,
    ) -> Result<(), Error> {
        self.send(app_id, message, MessageType::Out, source_type, source_instance)
    }

    /**
    Send a line the application wrote to its standard error.
    */
    pub fn send_app_error_log(
        &self,
        app_id: &str,
        message: &str,
        source_type: &str,
        source_instance: &str,
    ) -> Result<(), Error> {
        self.send(app_id, message, MessageType::Err, source_type, source_instance)
    }

    fn send(
        &self,
        app_id: &str,
        message: &str,
        message_type: MessageType,
        source_type: &str,
        source_instance: &str,
    ) -> Result<(), Error> {
        self.emitter.emit(
            LogMessage::new(app_id, message, message_type, source_type, source_instance).into(),
        )
    }
}
