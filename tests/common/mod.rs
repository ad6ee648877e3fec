//! Fixture models shared by the integration tests.
#![allow(dead_code)]

use shapemap::prelude::*;

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are ignored
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Inactive,
    Active,
}

shapemap::custom_value!(Status);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub address: Option<String>,
    pub city: Option<String>,
}

impl Mappable for Profile {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<Profile>("Profile")
            .default_constructible()
            .member("Address", |p: &Profile| p.address.clone(), |p, v| p.address = v)
            .member("City", |p: &Profile| p.city.clone(), |p, v| p.city = v)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Status,
    pub profile: Option<Profile>,
    pub age: i32,
}

impl User {
    pub fn new(name: &str) -> Self {
        User {
            id: 1,
            name: Some(name.to_string()),
            ..User::default()
        }
    }

    pub fn with_address(mut self, address: &str, city: &str) -> Self {
        self.profile = Some(Profile {
            address: Some(address.to_string()),
            city: Some(city.to_string()),
        });
        self
    }
}

impl Mappable for User {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<User>("User")
            .default_constructible()
            .member("Id", |u: &User| u.id, |u, v| u.id = v)
            .member("Name", |u: &User| u.name.clone(), |u, v| u.name = v)
            .member("Email", |u: &User| u.email.clone(), |u, v| u.email = v)
            .member("Status", |u: &User| u.status, |u, v| u.status = v)
            .nested("Profile", |u: &User| u.profile.as_ref())
            .member("Age", |u: &User| u.age, |u, v| u.age = v)
            .build()
    }
}

/// `audit` is not part of the schema; hooks write to it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserDto {
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub status: i32,
    pub is_active: bool,
    pub age: i32,
    pub nickname: Option<String>,
    pub audit: Vec<String>,
}

impl Mappable for UserDto {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<UserDto>("UserDto")
            .default_constructible()
            .member("Id", |d: &UserDto| d.id, |d, v| d.id = v)
            .member("Name", |d: &UserDto| d.name.clone(), |d, v| d.name = v)
            .member("Email", |d: &UserDto| d.email.clone(), |d, v| d.email = v)
            .member("Address", |d: &UserDto| d.address.clone(), |d, v| d.address = v)
            .member("City", |d: &UserDto| d.city.clone(), |d, v| d.city = v)
            .member("Status", |d: &UserDto| d.status, |d, v| d.status = v)
            .member("IsActive", |d: &UserDto| d.is_active, |d, v| d.is_active = v)
            .member("Age", |d: &UserDto| d.age, |d, v| d.age = v)
            .member("Nickname", |d: &UserDto| d.nickname.clone(), |d, v| d.nickname = v)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuestRecord {
    pub full_name: String,
    pub age: i32,
}

impl Mappable for GuestRecord {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<GuestRecord>("GuestRecord")
            .default_constructible()
            .member("FullName", |g: &GuestRecord| g.full_name.clone(), |g, v| g.full_name = v)
            .member("Age", |g: &GuestRecord| g.age, |g, v| g.age = v)
            .build()
    }
}

/// Like [`GuestRecord`], but the name may be missing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Applicant {
    pub full_name: Option<String>,
    pub age: i32,
}

impl Mappable for Applicant {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<Applicant>("Applicant")
            .default_constructible()
            .member("FullName", |a: &Applicant| a.full_name.clone(), |a, v| a.full_name = v)
            .member("Age", |a: &Applicant| a.age, |a, v| a.age = v)
            .build()
    }
}

/// Immutable, only constructible through its factory
#[derive(Debug, Clone, PartialEq)]
pub struct Guest {
    full_name: String,
    age: i32,
}

impl Guest {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn age(&self) -> i32 {
        self.age
    }
}

impl Mappable for Guest {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<Guest>("Guest")
            .read_only("FullName", |g: &Guest| g.full_name.clone())
            .read_only("Age", |g: &Guest| g.age)
            .param::<String>("fullName")
            .param::<i32>("age")
            .factory(|args| {
                Ok(Guest {
                    full_name: args.take("fullName")?,
                    age: args.take("age")?,
                })
            })
            .build()
    }
}

pub trait Greeter: Send {
    fn greet(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnglishGreeter {
    pub name: Option<String>,
}

impl Greeter for EnglishGreeter {
    fn greet(&self) -> String {
        format!("Hello, {}", self.name.as_deref().unwrap_or("stranger"))
    }
}

impl Mappable for EnglishGreeter {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<EnglishGreeter>("EnglishGreeter")
            .default_constructible()
            .member("Name", |g: &EnglishGreeter| g.name.clone(), |g, v| g.name = v)
            .build()
    }
}

pub fn english(greeter: EnglishGreeter) -> Box<dyn Greeter> {
    Box::new(greeter)
}
