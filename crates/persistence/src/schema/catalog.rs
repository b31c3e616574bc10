//! Schemas of the stored entities.

use domain::{
    AccessToken, AccessTokenPatch, Confirmation, ConfirmationPatch, Generic, GenericPatch,
    Message, MessagePatch, Person, PersonPatch, User, UserPatch,
};

use super::{FieldDef, FieldKind::*, Persistable};

macro_rules! impl_identity {
    () => {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }
    };
}

const USER_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", Text),
    FieldDef::new("name", Text),
    FieldDef::new("lastname", Text),
    FieldDef::new("username", Text),
    FieldDef::new("document_id", Text),
    FieldDef::new("email", Text),
    FieldDef::new("password_hash", Text),
    FieldDef::new("status", Bool),
    FieldDef::new("role", Text),
    FieldDef::new("created_at", DateTime),
    FieldDef::new("updated_at", DateTime),
    FieldDef::new("deleted_at", DateTime),
];

impl Persistable for User {
    type Patch = UserPatch;
    const NAME: &'static str = "users";
    const SOFT_DELETE_FIELD: Option<&'static str> = Some("deleted_at");

    fn fields() -> &'static [FieldDef] {
        USER_FIELDS
    }

    impl_identity!();
}

const GENERIC_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", Text),
    FieldDef::new("name", Text),
    FieldDef::new("description", Text),
    FieldDef::new("date", DateTime),
    FieldDef::new("status", Text),
];

impl Persistable for Generic {
    type Patch = GenericPatch;
    const NAME: &'static str = "generics";

    fn fields() -> &'static [FieldDef] {
        GENERIC_FIELDS
    }

    impl_identity!();
}

const CONFIRMATION_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", Text),
    FieldDef::new("session_id", Text),
    FieldDef::new("appointment_id", Text),
    FieldDef::new("patient_name", Text),
    FieldDef::new("rut", Text),
    FieldDef::new("phone_number", Text),
    FieldDef::new("service_name", Text),
    FieldDef::new("center_name", Text),
    FieldDef::new("created_datetime", DateTime),
    FieldDef::new("start_datetime", DateTime),
    FieldDef::new("appointment_datetime", DateTime),
    FieldDef::new("delivered_datetime", DateTime),
    FieldDef::new("template_id", Text),
];

impl Persistable for Confirmation {
    type Patch = ConfirmationPatch;
    const NAME: &'static str = "confirmations";

    fn fields() -> &'static [FieldDef] {
        CONFIRMATION_FIELDS
    }

    impl_identity!();
}

const MESSAGE_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", Text),
    FieldDef::new("confirmation_id", Text),
    FieldDef::new("sender", Text),
    FieldDef::new("text", Text),
    FieldDef::new("template_id", Text),
    FieldDef::new("template_text", Text),
    FieldDef::new("variables", Json),
    FieldDef::new("status", Text),
    FieldDef::new("timestamp", DateTime),
    FieldDef::new("external_id", Text),
];

impl Persistable for Message {
    type Patch = MessagePatch;
    const NAME: &'static str = "messages";

    fn fields() -> &'static [FieldDef] {
        MESSAGE_FIELDS
    }

    impl_identity!();
}

const PERSON_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", Text),
    FieldDef::new("name", Text),
    FieldDef::new("email", Text),
    FieldDef::new("role", Text),
    FieldDef::new("status", Bool),
];

impl Persistable for Person {
    type Patch = PersonPatch;
    const NAME: &'static str = "people";

    fn fields() -> &'static [FieldDef] {
        PERSON_FIELDS
    }

    impl_identity!();
}

const ACCESS_TOKEN_FIELDS: &[FieldDef] = &[
    FieldDef::new("id", Text),
    FieldDef::new("token", Text),
    FieldDef::new("created_at", DateTime),
];

impl Persistable for AccessToken {
    type Patch = AccessTokenPatch;
    const NAME: &'static str = "access_tokens";

    fn fields() -> &'static [FieldDef] {
        ACCESS_TOKEN_FIELDS
    }

    impl_identity!();
}
