pub mod email;

pub use email::{
    is_valid_address, EmailContent, EmailKind, EmailRequest, SendEmailResponse, UserData,
    ValidatedEmail,
};
