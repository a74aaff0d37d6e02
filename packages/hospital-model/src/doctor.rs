use crate::User;
use uuid::Uuid;

///
/// Reference to a doctor as it appears on patients and appointments.
///
/// Records may carry the doctor's user id, a display name, or both. Ids win
/// when both sides have one; otherwise names are compared after
/// normalisation. Names are compared whole, so "Smith" never matches
/// "Smithson".
///
#[derive(Clone, Debug, PartialEq)]
pub struct DoctorRef {
    pub id: Option<Uuid>,
    pub name: String,
}

impl DoctorRef {
    pub fn named(name: &str) -> Self {
        DoctorRef {
            id: None,
            name: name.to_string(),
        }
    }

    pub fn matches(&self, id: Option<Uuid>, name: Option<&str>) -> bool {
        if let (Some(a), Some(b)) = (self.id, id) {
            return a == b;
        }

        match name {
            Some(name) => {
                let lhs = normalize_name(&self.name);
                !lhs.is_empty() && lhs == normalize_name(name)
            }
            None => false,
        }
    }
}

impl From<&User> for DoctorRef {
    fn from(user: &User) -> Self {
        DoctorRef {
            id: user.id,
            name: user.name.to_owned(),
        }
    }
}

///
/// Lowercase, collapse whitespace and drop a leading "Dr"/"Dr." honorific
///
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();

    let stripped = lower
        .strip_prefix("dr.")
        .or_else(|| lower.strip_prefix("dr "))
        .unwrap_or(&lower);

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
