use strum_macros::Display;

/// Access level carried in the token claims.
///
/// Administrators are staff users; operators are regular users an
/// administrator has approved; everyone else is pending.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Operator = 2,
    Pending = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Operator),
            3 => Some(Role::Pending),
            _ => None,
        }
    }

    pub fn from_flags(is_staff: bool, is_approved: bool) -> Self {
        match (is_staff, is_approved) {
            (true, _) => Role::Admin,
            (false, true) => Role::Operator,
            (false, false) => Role::Pending,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_flag_wins_over_approval() {
        assert_eq!(Role::from_flags(true, false), Role::Admin);
        assert_eq!(Role::from_flags(false, true), Role::Operator);
        assert_eq!(Role::from_flags(false, false), Role::Pending);
    }

    #[test]
    fn ids_round_trip() {
        for role in [Role::Admin, Role::Operator, Role::Pending] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
    }

    #[test]
    fn displays_in_snake_case() {
        assert_eq!(Role::Operator.to_string(), "operator");
    }
}
