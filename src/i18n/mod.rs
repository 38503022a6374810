//! Internationalization (i18n) module.
//!
//! Provides localized strings for the application UI and CLI output.
//! English is the default language; Spanish is available as an alternative.
//! The architecture supports adding more languages in the future.

use std::sync::OnceLock;

static CURRENT_LANG: OnceLock<Lang> = OnceLock::new();

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English (default)
    En,
    /// Spanish
    Es,
}

impl Lang {
    /// Parse a language code string (e.g. "en", "es", "en_US", "es_ES").
    /// Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.to_lowercase();
        let prefix = normalized.split(['_', '-']).next().unwrap_or("");
        match prefix {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Return the ISO 639-1 code for this language.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

/// Initialize the global language. Call once at startup.
/// If already initialized, this is a no-op.
pub fn set_lang(lang: Lang) {
    let _ = CURRENT_LANG.set(lang);
}

/// Get the currently configured language (defaults to English).
pub fn lang() -> Lang {
    CURRENT_LANG.get().copied().unwrap_or(Lang::En)
}

/// Detect language from `GMAILCTRL_LANG`, then `LC_MESSAGES` / `LANG`.
pub fn detect_system_lang() -> Lang {
    std::env::var("GMAILCTRL_LANG")
        .ok()
        .and_then(|v| Lang::from_code(&v))
        .or_else(|| {
            std::env::var("LC_MESSAGES")
                .ok()
                .and_then(|v| Lang::from_code(&v))
        })
        .or_else(|| std::env::var("LANG").ok().and_then(|v| Lang::from_code(&v)))
        .unwrap_or(Lang::En)
}

/// Macro for defining translatable message functions.
/// Each function returns a `&'static str` based on the current language.
macro_rules! msg {
    ($name:ident, $en:expr, $es:expr) => {
        /// Returns a localized string for the current language.
        pub fn $name() -> &'static str {
            match lang() {
                Lang::En => $en,
                Lang::Es => $es,
            }
        }
    };
}

// ── General ──────────────────────────────────────────────────────

msg!(app_name, "gmailctrl", "gmailctrl");
msg!(
    app_about,
    "gmailctrl \u{2014} Cut Gmail clutter: group mail by sender, bulk-archive or trash whole senders, and download attachments into a dated local archive.",
    "gmailctrl \u{2014} Reduce el desorden de Gmail: agrupa el correo por remitente, archiva o elimina remitentes enteros y descarga adjuntos en un archivo local fechado."
);
msg!(
    app_long_about,
    "gmailctrl \u{2014} Cut Gmail clutter from the terminal.\nGroup messages by sender, plan bulk archive/trash requests,\nand download attachments into downloads/<sender>/<date> - <name>.",
    "gmailctrl \u{2014} Reduce el desorden de Gmail desde la terminal.\nAgrupa mensajes por remitente, prepara archivados/borrados masivos\ny descarga adjuntos en downloads/<remitente>/<fecha> - <nombre>."
);
msg!(
    app_after_help,
    "Input files are JSON arrays of Gmail API message resources (users.messages.get).",
    "Los ficheros de entrada son arrays JSON de recursos de mensaje de la API de Gmail (users.messages.get)."
);

// ── CLI help strings ─────────────────────────────────────────────

msg!(
    help_cmd_senders,
    "List senders ranked by message count",
    "Listar remitentes ordenados por n\u{fa}mero de mensajes"
);
msg!(
    help_cmd_show,
    "Show one sender group and its messages",
    "Mostrar un grupo de remitente y sus mensajes"
);
msg!(
    help_cmd_plan,
    "Print bulk archive/trash requests for selected senders",
    "Imprimir peticiones de archivado/borrado masivo para los remitentes elegidos"
);
msg!(
    help_cmd_download,
    "Download attachments into a dated per-sender archive",
    "Descargar adjuntos en un archivo fechado por remitente"
);
msg!(
    help_cmd_completions,
    "Generate shell completions",
    "Generar completions para tu shell"
);
msg!(
    help_cmd_manpage,
    "Generate a man page",
    "Generar p\u{e1}gina de manual"
);

// ── Sender output ────────────────────────────────────────────────

msg!(msg_messages_scanned, "Messages scanned", "Mensajes analizados");
msg!(msg_senders, "Senders", "Remitentes");
msg!(col_count, "Emails", "Correos");
msg!(col_sender, "Sender", "Remitente");
msg!(col_newest, "Newest", "M\u{e1}s reciente");
msg!(col_attachments, "Att.", "Adj.");
msg!(col_unsubscribe, "Unsub", "Baja");
msg!(col_subject, "Latest subject", "\u{da}ltimo asunto");
msg!(col_date, "Date", "Fecha");
msg!(msg_sender, "Sender", "Remitente");
msg!(msg_count, "Count", "Cantidad");
msg!(msg_date_range, "Date range", "Rango de fechas");
msg!(msg_attachments, "Attachments", "Adjuntos");
msg!(msg_unsubscribe, "Unsubscribe", "Baja");
msg!(msg_yes, "Yes", "S\u{ed}");
msg!(msg_no, "No", "No");

// ── Download output ──────────────────────────────────────────────

msg!(msg_downloading, "Downloading", "Descargando");
msg!(
    msg_no_attachments,
    "No attachments found to download.",
    "No se encontraron adjuntos para descargar."
);
msg!(col_directory, "Directory", "Directorio");
msg!(col_files, "Files", "Ficheros");
msg!(col_skipped, "Skipped", "Omitidos");
msg!(col_size, "Size", "Tama\u{f1}o");
msg!(msg_total, "Total", "Total");
msg!(
    msg_download_failed,
    "Download stopped on error",
    "Descarga detenida por un error"
);

// ── Errors ───────────────────────────────────────────────────────

msg!(
    err_file_not_found,
    "File not found",
    "Fichero no encontrado"
);
msg!(
    err_sender_not_found,
    "No messages from sender",
    "No hay mensajes del remitente"
);
