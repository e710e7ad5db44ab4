use super::{ensure_affected, DbError};
use crate::models::{NewVillage, User, Village};
use sqlx::{SqliteExecutor, SqlitePool};

pub struct VillageRepository {
    pool: SqlitePool,
}

impl VillageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, village: &NewVillage) -> Result<Village, DbError> {
        let now = chrono::Utc::now().timestamp();
        let village = sqlx::query_as::<_, Village>(
            "INSERT INTO villages (name, region, icon, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *"
        )
        .bind(&village.name)
        .bind(&village.region)
        .bind(&village.icon)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(village)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Village>, DbError> {
        let village = sqlx::query_as::<_, Village>("SELECT * FROM villages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(village)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Village>, DbError> {
        let village = sqlx::query_as::<_, Village>("SELECT * FROM villages WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(village)
    }

    pub async fn list(&self) -> Result<Vec<Village>, DbError> {
        let villages = sqlx::query_as::<_, Village>("SELECT * FROM villages ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(villages)
    }

    pub async fn update(&self, id: i64, village: &NewVillage) -> Result<Village, DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_as::<_, Village>(
            "UPDATE villages SET name = ?, region = ?, icon = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
        .bind(&village.name)
        .bind(&village.region)
        .bind(&village.icon)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    /// Delete a village; its former members become villageless
    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM villages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result.rows_affected())
    }

    pub async fn members(&self, id: i64) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE village_id = ? ORDER BY xp DESC, id ASC"
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn add_total_xp(&self, id: i64, amount: i64) -> Result<i64, DbError> {
        add_total_xp(&self.pool, id, amount).await
    }

    /// Reset `total_xp` to the sum of the current members' xp
    pub async fn recompute_total_xp(&self, id: i64) -> Result<i64, DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query_scalar(
            "UPDATE villages
             SET total_xp = (SELECT COALESCE(SUM(xp), 0) FROM users WHERE village_id = villages.id),
                 updated_at = ?
             WHERE id = ?
             RETURNING total_xp"
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<Village>, DbError> {
        let villages = sqlx::query_as::<_, Village>(
            "SELECT * FROM villages ORDER BY total_xp DESC, id ASC LIMIT ?"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(villages)
    }
}

pub(crate) async fn add_total_xp<'e, E: SqliteExecutor<'e>>(executor: E, id: i64, amount: i64) -> Result<i64, DbError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query_scalar("UPDATE villages SET total_xp = total_xp + ?, updated_at = ? WHERE id = ? RETURNING total_xp")
        .bind(amount)
        .bind(now)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(DbError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::user::UserRepository;
    use crate::models::NewUser;

    fn new_village(name: &str) -> NewVillage {
        NewVillage {
            name: name.to_string(),
            region: "north".to_string(),
            icon: "pine".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_round_trip() {
        let repo = VillageRepository::new(test_pool().await);
        let created = repo.create(&new_village("Oakridge")).await.unwrap();
        let fetched = repo.get_by_name("Oakridge").await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.region, "north");
        assert_eq!(fetched.icon, "pine");
        assert_eq!(fetched.total_xp, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = VillageRepository::new(test_pool().await);
        repo.create(&new_village("Oakridge")).await.unwrap();
        let err = repo.create(&new_village("Oakridge")).await.unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_delete_detaches_members() {
        let pool = test_pool().await;
        let villages = VillageRepository::new(pool.clone());
        let users = UserRepository::new(pool);

        let village = villages.create(&new_village("Oakridge")).await.unwrap();
        let user = users
            .create(&NewUser::new("ann".into(), "ann@example.com".into(), "h".into()))
            .await
            .unwrap();
        users.set_village(user.id, Some(village.id)).await.unwrap();
        assert_eq!(villages.members(village.id).await.unwrap().len(), 1);

        villages.delete(village.id).await.unwrap();
        assert_eq!(users.require(user.id).await.unwrap().village_id, None);
    }

    #[tokio::test]
    async fn test_recompute_total_xp() {
        let pool = test_pool().await;
        let villages = VillageRepository::new(pool.clone());
        let users = UserRepository::new(pool);
        let village = villages.create(&new_village("Oakridge")).await.unwrap();

        for (name, xp) in [("a", 120), ("b", 80)] {
            let user = users
                .create(&NewUser::new(name.into(), format!("{name}@example.com"), "h".into()))
                .await
                .unwrap();
            users.add_xp(user.id, xp).await.unwrap();
            users.set_village(user.id, Some(village.id)).await.unwrap();
        }

        villages.add_total_xp(village.id, 7).await.unwrap();
        assert_eq!(villages.recompute_total_xp(village.id).await.unwrap(), 200);
        assert!(matches!(villages.recompute_total_xp(999).await, Err(DbError::NotFound)));
    }
}
