#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Employee = 1,
    Admin = 2,
    SuperAdmin = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Employee),
            2 => Some(Role::Admin),
            3 => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}
