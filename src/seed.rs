// File: ./src/seed.rs
// Demo journal installed into an empty slot on first run.
use crate::model::{Event, EventStatus, PrimaryType};

struct SeedRow {
    id: &'static str,
    primary_type: PrimaryType,
    sub_type: &'static str,
    title: &'static str,
    content: &'static str,
    time: &'static str,
    dialog: &'static str,
}

const SEED_ROWS: [SeedRow; 6] = [
    SeedRow {
        id: "1",
        primary_type: PrimaryType::Emotional,
        sub_type: "emotionalLow",
        title: "Feeling low",
        content: "Anxious and dejected, unable to control mood swings",
        time: "2024-04-05 10:30",
        dialog: "Lately I often feel anxious for no reason, especially at night when I'm alone. Sometimes I suddenly feel very down and can't control it.",
    },
    SeedRow {
        id: "2",
        primary_type: PrimaryType::Cognitive,
        sub_type: "negativeThinking",
        title: "Negative thinking",
        content: "Keeps replaying past failures and feels not good enough",
        time: "2024-04-05 14:20",
        dialog: "I keep thinking about the interview I failed last year. I feel I'll never measure up, no matter how hard I try.",
    },
    SeedRow {
        id: "3",
        primary_type: PrimaryType::Interpersonal,
        sub_type: "conflict",
        title: "Conflict with roommate",
        content: "Argued with a roommate about habits and felt misunderstood",
        time: "2024-04-06 09:15",
        dialog: "Yesterday my roommate and I argued about tidying the room again. She thinks I'm too picky, but I just want a clean place.",
    },
    SeedRow {
        id: "4",
        primary_type: PrimaryType::Behavioral,
        sub_type: "avoidance",
        title: "Avoidance",
        content: "Made an excuse to skip a friend's party and stayed alone",
        time: "2024-04-06 16:40",
        dialog: "A friend invited me to a birthday party this weekend. I said I had to work overtime, but really I'm afraid of crowded places.",
    },
    SeedRow {
        id: "5",
        primary_type: PrimaryType::Physiological,
        sub_type: "sleepIssues",
        title: "Sleep problems",
        content: "Three nights of trouble falling asleep and waking before dawn",
        time: "2024-04-07 07:30",
        dialog: "I've slept badly these past days. It takes ages to fall asleep and I often wake up in the middle of the night, exhausted.",
    },
    SeedRow {
        id: "6",
        primary_type: PrimaryType::LifeEvent,
        sub_type: "transition",
        title: "Life transition",
        content: "Considering a job offer in another city but worried about adapting",
        time: "2024-04-07 15:20",
        dialog: "I got an offer from a company in Beijing. The salary is great, but I've never left my hometown and I'm not sure I can adapt.",
    },
];

/// Six pending records, one per primary type, in display order.
pub fn demo_events() -> Vec<Event> {
    SEED_ROWS
        .iter()
        .enumerate()
        .map(|(idx, row)| Event {
            id: row.id.to_string(),
            primary_type: Some(row.primary_type),
            sub_type: row.sub_type.to_string(),
            title: row.title.to_string(),
            content: row.content.to_string(),
            dialog_content: row.dialog.to_string(),
            time: row.time.to_string(),
            create_time: row.time.to_string(),
            update_time: row.time.to_string(),
            status: EventStatus::Pending,
            tag_color: row.primary_type.default_color().to_string(),
            source_dialog_id: format!("dialog_{:03}", idx + 1),
        })
        .collect()
}
