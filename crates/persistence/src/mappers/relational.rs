//! Domain <-> SeaORM model mappers.

use common::{AppError, AppResult};
use domain::{AccessToken, Confirmation, Generic, Message, MessageStatus, Person, Role, Sender, User};

use super::EntityMapper;
use crate::relational::entities::{access_token, confirmation, generic, message, person, user};

pub struct UserMapper;

impl EntityMapper for UserMapper {
    type Domain = User;
    type Persisted = user::Model;

    fn to_domain(m: user::Model) -> AppResult<User> {
        Ok(User {
            id: m.id,
            name: m.name,
            lastname: m.lastname,
            username: m.username,
            document_id: m.document_id,
            email: m.email,
            password_hash: m.password_hash,
            status: m.status,
            role: m.role.map(Role::from),
            created_at: m.created_at,
            updated_at: m.updated_at,
            deleted_at: m.deleted_at,
        })
    }

    fn to_persistence(u: &User) -> user::Model {
        user::Model {
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

pub struct GenericMapper;

impl EntityMapper for GenericMapper {
    type Domain = Generic;
    type Persisted = generic::Model;

    fn to_domain(m: generic::Model) -> AppResult<Generic> {
        Ok(Generic {
            id: m.id,
            name: m.name,
            description: m.description,
            date: m.date,
            status: m.status,
        })
    }

    fn to_persistence(g: &Generic) -> generic::Model {
        generic::Model {
            id: g.id.clone(),
            name: g.name.clone(),
            description: g.description.clone(),
            date: g.date,
            status: g.status.clone(),
        }
    }
}

pub struct ConfirmationMapper;

impl EntityMapper for ConfirmationMapper {
    type Domain = Confirmation;
    type Persisted = confirmation::Model;

    fn to_domain(m: confirmation::Model) -> AppResult<Confirmation> {
        Ok(Confirmation {
            id: m.id,
            session_id: m.session_id,
            appointment_id: m.appointment_id,
            patient_name: m.patient_name,
            rut: m.rut,
            phone_number: m.phone_number,
            service_name: m.service_name,
            center_name: m.center_name,
            created_datetime: m.created_datetime,
            start_datetime: m.start_datetime,
            appointment_datetime: m.appointment_datetime,
            delivered_datetime: m.delivered_datetime,
            template_id: m.template_id,
        })
    }

    fn to_persistence(c: &Confirmation) -> confirmation::Model {
        confirmation::Model {
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

pub struct MessageMapper;

impl EntityMapper for MessageMapper {
    type Domain = Message;
    type Persisted = message::Model;

    fn to_domain(m: message::Model) -> AppResult<Message> {
        let status = m
            .status
            .as_deref()
            .map(|s| {
                MessageStatus::parse(s)
                    .ok_or_else(|| AppError::internal(format!("unknown message status `{}`", s)))
            })
            .transpose()?;

        Ok(Message {
            id: m.id,
            confirmation_id: m.confirmation_id,
            sender: Sender::from(m.sender.as_str()),
            text: m.text,
            template_id: m.template_id,
            template_text: m.template_text,
            variables: m.variables,
            status,
            timestamp: m.timestamp,
            external_id: m.external_id,
        })
    }

    fn to_persistence(msg: &Message) -> message::Model {
        message::Model {
            id: msg.id.clone(),
            confirmation_id: msg.confirmation_id.clone(),
            sender: msg.sender.as_str().to_string(),
            text: msg.text.clone(),
            template_id: msg.template_id.clone(),
            template_text: msg.template_text.clone(),
            variables: msg.variables.clone(),
            status: msg.status.map(|s| s.as_str().to_string()),
            timestamp: msg.timestamp,
            external_id: msg.external_id.clone(),
        }
    }
}

pub struct PersonMapper;

impl EntityMapper for PersonMapper {
    type Domain = Person;
    type Persisted = person::Model;

    fn to_domain(m: person::Model) -> AppResult<Person> {
        Ok(Person {
            id: m.id,
            name: m.name,
            email: m.email,
            role: Role::from(m.role),
            status: m.status,
            additional_data: None,
        })
    }

    /// `additional_data` is transient and never stored.
    fn to_persistence(p: &Person) -> person::Model {
        person::Model {
            id: p.id.clone(),
            name: p.name.clone(),
            email: p.email.clone(),
            role: p.role.as_str().to_string(),
            status: p.status,
        }
    }
}

pub struct AccessTokenMapper;

impl EntityMapper for AccessTokenMapper {
    type Domain = AccessToken;
    type Persisted = access_token::Model;

    fn to_domain(m: access_token::Model) -> AppResult<AccessToken> {
        Ok(AccessToken {
            id: m.id,
            token: m.token,
            created_at: m.created_at,
        })
    }

    fn to_persistence(t: &AccessToken) -> access_token::Model {
        access_token::Model {
            id: t.id.clone(),
            token: t.token.clone(),
            created_at: t.created_at,
        }
    }
}
