use vox_shared::UserSummary;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub role: String,
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        UserSummary {
            id: row.id,
            name: row.name,
            profile_image: row.profile_image,
            role: row.role,
        }
    }
}
