//! Domain <-> stored document mappers.

use common::{AppError, AppResult};
use domain::{AccessToken, Confirmation, Generic, Message, MessageStatus, Person, Role, Sender, User};

use super::EntityMapper;
use crate::document::records::{
    AccessTokenDoc, ConfirmationDoc, GenericDoc, MessageDoc, PersonDoc, UserDoc,
};

pub struct UserDocMapper;

impl EntityMapper for UserDocMapper {
    type Domain = User;
    type Persisted = UserDoc;

    fn to_domain(d: UserDoc) -> AppResult<User> {
        Ok(User {
            id: d.id,
            name: d.name,
            lastname: d.lastname,
            username: d.username,
            document_id: d.document_id,
            email: d.email,
            password_hash: d.password_hash,
            status: d.status,
            role: d.role.map(Role::from),
            created_at: d.created_at,
            updated_at: d.updated_at,
            deleted_at: d.deleted_at,
        })
    }

    fn to_persistence(u: &User) -> UserDoc {
        UserDoc {
            id: u.id.clone(),
            name: u.name.clone(),
            lastname: u.lastname.clone(),
            username: u.username.clone(),
            document_id: u.document_id.clone(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            status: u.status,
            role: u.role.map(String::from),
            created_at: u.created_at,
            updated_at: u.updated_at,
            deleted_at: u.deleted_at,
        }
    }
}

pub struct GenericDocMapper;

impl EntityMapper for GenericDocMapper {
    type Domain = Generic;
    type Persisted = GenericDoc;

    fn to_domain(d: GenericDoc) -> AppResult<Generic> {
        Ok(Generic {
            id: d.id,
            name: d.name,
            description: d.description,
            date: d.date,
            status: d.status,
        })
    }

    fn to_persistence(g: &Generic) -> GenericDoc {
        GenericDoc {
            id: g.id.clone(),
            name: g.name.clone(),
            description: g.description.clone(),
            date: g.date,
            status: g.status.clone(),
        }
    }
}

pub struct ConfirmationDocMapper;

impl EntityMapper for ConfirmationDocMapper {
    type Domain = Confirmation;
    type Persisted = ConfirmationDoc;

    fn to_domain(d: ConfirmationDoc) -> AppResult<Confirmation> {
        Ok(Confirmation {
            id: d.id,
            session_id: d.session_id,
            appointment_id: d.appointment_id,
            patient_name: d.patient_name,
            rut: d.rut,
            phone_number: d.phone_number,
            service_name: d.service_name,
            center_name: d.center_name,
            created_datetime: d.created_datetime,
            start_datetime: d.start_datetime,
            appointment_datetime: d.appointment_datetime,
            delivered_datetime: d.delivered_datetime,
            template_id: d.template_id,
        })
    }

    fn to_persistence(c: &Confirmation) -> ConfirmationDoc {
        ConfirmationDoc {
            id: c.id.clone(),
            session_id: c.session_id.clone(),
            appointment_id: c.appointment_id.clone(),
            patient_name: c.patient_name.clone(),
            rut: c.rut.clone(),
            phone_number: c.phone_number.clone(),
            service_name: c.service_name.clone(),
            center_name: c.center_name.clone(),
            created_datetime: c.created_datetime,
            start_datetime: c.start_datetime,
            appointment_datetime: c.appointment_datetime,
            delivered_datetime: c.delivered_datetime,
            template_id: c.template_id.clone(),
        }
    }
}

pub struct MessageDocMapper;

impl EntityMapper for MessageDocMapper {
    type Domain = Message;
    type Persisted = MessageDoc;

    fn to_domain(d: MessageDoc) -> AppResult<Message> {
        let variables = d
            .variables
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let status = d
            .status
            .as_deref()
            .map(|s| {
                MessageStatus::parse(s)
                    .ok_or_else(|| AppError::internal(format!("unknown message status `{}`", s)))
            })
            .transpose()?;

        Ok(Message {
            id: d.id,
            confirmation_id: d.confirmation_id,
            sender: Sender::from(d.sender.as_str()),
            text: d.text,
            template_id: d.template_id,
            template_text: d.template_text,
            variables,
            status,
            timestamp: d.timestamp,
            external_id: d.external_id,
        })
    }

    fn to_persistence(m: &Message) -> MessageDoc {
        MessageDoc {
            id: m.id.clone(),
            confirmation_id: m.confirmation_id.clone(),
            sender: m.sender.as_str().to_string(),
            text: m.text.clone(),
            template_id: m.template_id.clone(),
            template_text: m.template_text.clone(),
            variables: m.variables.as_ref().map(|v| v.to_string()),
            status: m.status.map(|s| s.as_str().to_string()),
            timestamp: m.timestamp,
            external_id: m.external_id.clone(),
        }
    }
}

pub struct PersonDocMapper;

impl EntityMapper for PersonDocMapper {
    type Domain = Person;
    type Persisted = PersonDoc;

    fn to_domain(d: PersonDoc) -> AppResult<Person> {
        Ok(Person {
            id: d.id,
            name: d.name,
            email: d.email,
            role: Role::from(d.role),
            status: d.status,
            additional_data: None,
        })
    }

    fn to_persistence(p: &Person) -> PersonDoc {
        PersonDoc {
            id: p.id.clone(),
            name: p.name.clone(),
            email: p.email.clone(),
            role: p.role.as_str().to_string(),
            status: p.status,
        }
    }
}

pub struct AccessTokenDocMapper;

impl EntityMapper for AccessTokenDocMapper {
    type Domain = AccessToken;
    type Persisted = AccessTokenDoc;

    fn to_domain(d: AccessTokenDoc) -> AppResult<AccessToken> {
        Ok(AccessToken {
            id: d.id,
            token: d.token,
            created_at: d.created_at,
        })
    }

    fn to_persistence(t: &AccessToken) -> AccessTokenDoc {
        AccessTokenDoc {
            id: t.id.clone(),
            token: t.token.clone(),
            created_at: t.created_at,
        }
    }
}
