//! Fixture models shared by the unit tests.

use crate::schema::{Mappable, TypeSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Inactive,
    Active,
}

crate::custom_value!(Status);

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
    // Helper function to create a fully populated user without an email
    pub fn sample() -> Self {
        User {
            id: 7,
            name: Some("ali".into()),
            email: None,
            status: Status::Active,
            profile: Some(Profile {
                address: Some("Jl. Mawar".into()),
                city: Some("Bandung".into()),
            }),
            age: 30,
        }
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

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserDto {
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: i32,
    pub is_active: bool,
    pub city: Option<String>,
    pub age: i32,
}

impl Mappable for UserDto {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<UserDto>("UserDto")
            .default_constructible()
            .member("Id", |d: &UserDto| d.id, |d, v| d.id = v)
            .member("Name", |d: &UserDto| d.name.clone(), |d, v| d.name = v)
            .member("Email", |d: &UserDto| d.email.clone(), |d, v| d.email = v)
            .member("Status", |d: &UserDto| d.status, |d, v| d.status = v)
            .member("IsActive", |d: &UserDto| d.is_active, |d, v| d.is_active = v)
            .member("City", |d: &UserDto| d.city.clone(), |d, v| d.city = v)
            .member("Age", |d: &UserDto| d.age, |d, v| d.age = v)
            .build()
    }
}

/// Constructed through a factory only
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    name: String,
    age: i32,
}

impl Person {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i32 {
        self.age
    }
}

impl Mappable for Person {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<Person>("Person")
            .read_only("Name", |p: &Person| p.name.clone())
            .read_only("Age", |p: &Person| p.age)
            .param::<String>("name")
            .param::<i32>("age")
            .factory(|args| {
                Ok(Person {
                    name: args.take("name")?,
                    age: args.take("age")?,
                })
            })
            .build()
    }
}

/// Read-only and not constructible
pub struct Account {
    pub name: String,
    pub age: u8,
}

impl Mappable for Account {
    fn describe() -> TypeSchema {
        TypeSchema::builder::<Account>("Account")
            .read_only("Name", |a: &Account| a.name.clone())
            .read_only("Age", |a: &Account| a.age)
            .build()
    }
}
