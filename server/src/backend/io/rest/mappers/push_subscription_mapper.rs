use crate::backend::domain::models::datetime::format_utc;
use crate::backend::domain::models::push_subscription::PushSubscription as DomainPushSubscription;
use shared::PushSubscription as SharedPushSubscription;

/// Mapper to convert domain push subscriptions into shared DTOs.
pub struct PushSubscriptionMapper;

impl PushSubscriptionMapper {
    pub fn to_dto(domain: DomainPushSubscription) -> SharedPushSubscription {
        SharedPushSubscription {
            id: domain.id,
            user_id: domain.user_id,
            endpoint: domain.endpoint,
            p256dh: domain.p256dh,
            auth: domain.auth,
            device_info: domain.device_info,
            is_active: domain.is_active,
            created_at: format_utc(domain.created_at),
            updated_at: format_utc(domain.updated_at),
        }
    }
}
