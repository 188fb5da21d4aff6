//! 只读查询

use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::debug;

use super::converters::model_to_user;
use super::{SeaOrmUserRepository, retry};
use crate::errors::{AppError, Result};
use crate::storage::{User, UserFilter};

use migration::entities::user;

/// 选用不需要字符串转义的字符，各数据库渲染一致
const LIKE_ESCAPE: char = '!';

/// 转义 LIKE 通配符，使关键字按字面量匹配
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(keyword: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(keyword))).escape(LIKE_ESCAPE)
}

/// 把过滤条件翻译成 WHERE 子句
fn filter_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(keyword) = filter.keyword.as_deref().map(str::trim)
        && !keyword.is_empty()
    {
        condition = condition.add(
            Condition::any()
                .add(user::Column::Username.like(contains_pattern(keyword)))
                .add(user::Column::Email.like(contains_pattern(keyword))),
        );
    }

    if let Some(status) = filter.status {
        condition = condition.add(user::Column::Status.eq(status.as_i16()));
    }

    condition
}

impl SeaOrmUserRepository {
    pub(super) async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("find_by_id({})", id), self.retry_config, || async {
            user::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| AppError::database_operation(format!("查询用户失败: {}", e)))?;

        Ok(model.map(model_to_user))
    }

    pub(super) async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry("find_by_email", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(db)
                .await
        })
        .await
        .map_err(|e| AppError::database_operation(format!("按邮箱查询用户失败: {}", e)))?;

        Ok(model.map(model_to_user))
    }

    /// 有界查询：按创建时间倒序取一页
    pub(super) async fn load_filtered(
        &self,
        filter: &UserFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<User>> {
        let db = &self.db;
        let condition = filter_condition(filter);

        let models = retry::with_retry("load_filtered(data)", self.retry_config, || async {
            user::Entity::find()
                .filter(condition.clone())
                .order_by_desc(user::Column::CreatedAt)
                .order_by_desc(user::Column::Id)
                .offset(offset)
                .limit(limit)
                .all(db)
                .await
        })
        .await
        .map_err(|e| AppError::database_operation(format!("分页查询用户失败: {}", e)))?;

        debug!(
            "Loaded {} users (offset {}, limit {})",
            models.len(),
            offset,
            limit
        );
        Ok(models.into_iter().map(model_to_user).collect())
    }

    /// 计数查询，与分页无关
    pub(super) async fn count_filtered(&self, filter: &UserFilter) -> Result<u64> {
        let db = &self.db;
        let condition = filter_condition(filter);

        retry::with_retry("load_filtered(count)", self.retry_config, || async {
            user::Entity::find()
                .filter(condition.clone())
                .count(db)
                .await
        })
        .await
        .map_err(|e| AppError::database_operation(format!("统计用户数量失败: {}", e)))
    }
}
