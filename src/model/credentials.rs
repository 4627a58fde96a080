//! Payloads that mutate the remote session.

/// Email/password pair submitted by the login form.
#[derive(Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of trace output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// An uploaded image file.
#[derive(Clone, Default)]
pub struct ProfilePicture {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ProfilePicture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilePicture")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Fields submitted by the sign-up form.
#[derive(Clone, Default)]
pub struct SignUpFields {
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile_pic: Option<ProfilePicture>,
}

impl std::fmt::Debug for SignUpFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpFields")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("profile_pic", &self.profile_pic)
            .finish_non_exhaustive()
    }
}
