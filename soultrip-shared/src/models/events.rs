use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    Created,
    Reactivated,
    Deleted,
    SoftCancelled,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingLifecycleEvent {
    pub kind: LifecycleKind,
    pub booking_id: Uuid,
    pub tour_id: Uuid,
    pub participant_id: Uuid,
    pub timestamp: i64,
}

impl BookingLifecycleEvent {
    pub fn now(kind: LifecycleKind, booking_id: Uuid, tour_id: Uuid, participant_id: Uuid) -> Self {
        Self {
            kind,
            booking_id,
            tour_id,
            participant_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = BookingLifecycleEvent::now(
            LifecycleKind::SoftCancelled,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "soft_cancelled");
        assert_eq!(json["tour_id"], event.tour_id.to_string());
    }
}
