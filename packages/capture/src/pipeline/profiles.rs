//! Per-platform selector profiles.
//!
//! Third-party chat DOMs change without notice, so everything fragile
//! lives here as declarative data: which selectors find message
//! elements (in fallback tiers), how an element's actor is resolved,
//! where content and attachments hide, and where the model name shows.
//! The extractor interprets these tables and contains no per-platform
//! branching of its own.

use crate::types::Platform;

/// One extraction tier. Tiers are tried in order; a tier runs only if
/// every earlier tier produced nothing, and tiers are never merged.
#[derive(Debug)]
pub enum Tier {
    /// Elements whose actor is known from which selector matched them.
    Roles {
        /// Selector for user turns
        user: &'static str,
        /// Content selectors inside a user turn, most specific first
        user_content: &'static [&'static str],
        /// Selector for assistant turns
        assistant: &'static str,
        /// Content selectors inside an assistant turn
        assistant_content: &'static [&'static str],
    },

    /// Elements of unknown actor, classified one by one.
    Mixed {
        /// Comma-grouped selector; one query keeps document order
        selector: &'static str,
    },

    /// Last resort: every sufficiently long text block on the page,
    /// actors alternating by position starting with the user.
    TextBlocks,
}

/// An attribute whose value names the actor directly.
#[derive(Debug)]
pub struct RoleAttr {
    pub attr: &'static str,
    pub user_value: &'static str,
    pub assistant_value: &'static str,
}

/// Rules for resolving an element's actor, applied in priority order:
/// role attributes, container class names, a user-content probe,
/// leading text markers, then positional parity if enabled.
#[derive(Debug)]
pub struct ActorRules {
    /// Checked on the element itself and on its ancestors
    pub role_attrs: &'static [RoleAttr],

    /// Class names (own or ancestor) marking a user turn
    pub user_classes: &'static [&'static str],

    /// Class names (own or ancestor) marking an assistant turn
    pub assistant_classes: &'static [&'static str],

    /// Descendant selector whose presence marks a user container and
    /// whose absence marks an assistant container; definite either way
    pub user_probe: Option<&'static str>,

    /// Leading text markers for user turns (e.g. `"You:"`)
    pub user_prefixes: &'static [&'static str],

    /// Leading text markers for assistant turns
    pub assistant_prefixes: &'static [&'static str],

    /// Fall back to odd/even position among siblings (odd = user)
    pub positional_parity: bool,
}

/// Where attachments live inside a message element. An empty containers
/// selector means the platform never shows extractable attachments.
#[derive(Debug)]
pub struct AttachmentSelectors {
    pub containers: &'static str,
    pub name: &'static str,
}

/// How the requested model name is discovered.
#[derive(Debug)]
pub enum ModelRule {
    /// Comma-grouped selector tried against the whole page
    Selectors(&'static str),
    /// The platform never shows it; report a fixed label
    Fixed(&'static str),
}

/// Everything the extractor needs to know about one platform.
#[derive(Debug)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub tiers: &'static [Tier],
    pub actor_rules: ActorRules,
    /// Content selectors inside a mixed message element, most specific first
    pub content_selectors: &'static [&'static str],
    pub attachments: AttachmentSelectors,
    pub model: ModelRule,
}

const NO_ATTACHMENTS: AttachmentSelectors = AttachmentSelectors {
    containers: "",
    name: "",
};

static CHATGPT: PlatformProfile = PlatformProfile {
    platform: Platform::ChatGpt,
    tiers: &[
        Tier::Mixed {
            selector: "[data-message-author-role], \
                       [data-testid=\"conversation-turn-user\"], \
                       [data-testid=\"conversation-turn-assistant\"]",
        },
        Tier::Mixed {
            selector: ".text-message, .message",
        },
        Tier::Mixed { selector: ".prose" },
        Tier::TextBlocks,
    ],
    actor_rules: ActorRules {
        role_attrs: &[
            RoleAttr {
                attr: "data-message-author-role",
                user_value: "user",
                assistant_value: "assistant",
            },
            RoleAttr {
                attr: "data-testid",
                user_value: "conversation-turn-user",
                assistant_value: "conversation-turn-assistant",
            },
        ],
        user_classes: &["user"],
        assistant_classes: &["assistant"],
        user_probe: None,
        user_prefixes: &["You:", "You said:", "User:"],
        assistant_prefixes: &["ChatGPT:", "GPT:", "Assistant:"],
        positional_parity: false,
    },
    content_selectors: &[".text-message-content", ".message-content", ".prose", ".markdown"],
    attachments: AttachmentSelectors {
        containers: ".attachment, .file-attachment, [data-testid=\"attachment\"]",
        name: ".file-name",
    },
    model: ModelRule::Selectors(".model-name, [aria-label*=\"Model:\"], button[aria-label*=\"model\"]"),
};

static CLAUDE: PlatformProfile = PlatformProfile {
    platform: Platform::Claude,
    tiers: &[
        Tier::Mixed {
            selector: ".message-content, .message, .human-message, \
                       .claude-message, .assistant-message, .user-message",
        },
        Tier::TextBlocks,
    ],
    actor_rules: ActorRules {
        role_attrs: &[],
        user_classes: &["human-message", "user-message"],
        assistant_classes: &["claude-message", "ai-message", "assistant-message"],
        user_probe: None,
        user_prefixes: &["You:", "Human:"],
        assistant_prefixes: &["Claude:", "Assistant:"],
        positional_parity: false,
    },
    content_selectors: &[],
    attachments: AttachmentSelectors {
        containers: ".attachment, .file-item",
        name: ".file-name",
    },
    model: ModelRule::Selectors(".model-name, .version-info"),
};

static GEMINI: PlatformProfile = PlatformProfile {
    platform: Platform::Gemini,
    tiers: &[
        Tier::Roles {
            user: "user-query, .user-query-container",
            user_content: &[".query-text", ".user-query-bubble", ".query-content"],
            assistant: "model-response, .response-container, .presented-response-container",
            assistant_content: &[
                ".response-content",
                ".model-response-text",
                "message-content",
                ".markdown",
            ],
        },
        // Conversation turn containers named by id pattern in the Angular app
        Tier::Mixed {
            selector: "div[id^=\"8\"], div[id^=\"c_\"], div[id^=\"r_\"]",
        },
        Tier::TextBlocks,
    ],
    actor_rules: ActorRules {
        role_attrs: &[RoleAttr {
            attr: "data-role",
            user_value: "user",
            assistant_value: "assistant",
        }],
        user_classes: &["user-query", "user-message", "user-row"],
        assistant_classes: &["bard-response", "ai-response", "model-response", "model-row"],
        user_probe: Some("user-query"),
        user_prefixes: &["You:"],
        assistant_prefixes: &["AI:"],
        positional_parity: true,
    },
    content_selectors: &[".message-content", ".response-text", "p", ".gemini-message-content"],
    attachments: NO_ATTACHMENTS,
    model: ModelRule::Fixed("Google Gemini"),
};

static POE: PlatformProfile = PlatformProfile {
    platform: Platform::Poe,
    tiers: &[
        Tier::Mixed {
            selector: ".MessageItem, .ChatMessage, .message, .human, .bot",
        },
        Tier::TextBlocks,
    ],
    actor_rules: ActorRules {
        role_attrs: &[RoleAttr {
            attr: "data-message-author-type",
            user_value: "human",
            assistant_value: "bot",
        }],
        user_classes: &["human"],
        assistant_classes: &["bot"],
        user_probe: None,
        user_prefixes: &[],
        assistant_prefixes: &[],
        positional_parity: false,
    },
    content_selectors: &[".message-content", ".MessageContent"],
    attachments: NO_ATTACHMENTS,
    model: ModelRule::Selectors(".bot-name, .BotName"),
};

static PERPLEXITY: PlatformProfile = PlatformProfile {
    platform: Platform::Perplexity,
    tiers: &[
        Tier::Mixed {
            selector: ".message, .conversation-message, .query, .answer, .query-response",
        },
        Tier::TextBlocks,
    ],
    actor_rules: ActorRules {
        role_attrs: &[],
        user_classes: &["user-query", "query"],
        assistant_classes: &["answer", "response", "query-response"],
        user_probe: None,
        user_prefixes: &[],
        assistant_prefixes: &[],
        positional_parity: false,
    },
    content_selectors: &[".content", ".text-content"],
    attachments: NO_ATTACHMENTS,
    model: ModelRule::Selectors(".model-name, .ModelName"),
};

/// Look up the profile for a platform.
pub fn profile(platform: Platform) -> &'static PlatformProfile {
    match platform {
        Platform::ChatGpt => &CHATGPT,
        Platform::Claude => &CLAUDE,
        Platform::Gemini => &GEMINI,
        Platform::Poe => &POE,
        Platform::Perplexity => &PERPLEXITY,
    }
}
