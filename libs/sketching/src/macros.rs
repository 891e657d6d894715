#[macro_export]
macro_rules! tagged_event {
    ($level:ident, $event_tag:path, $($arg:tt)*) => {{
        fn assert_eventtag(_: &$crate::EventTag) {}
        assert_eventtag(&$event_tag);
        let event_tag_id: u64 = $event_tag.into();
        $crate::tracing::event!($crate::tracing::Level::$level, event_tag_id, $($arg)*)
    }}
}

#[macro_export]
macro_rules! admin_debug {
    ($($arg:tt)*) => { $crate::tagged_event!(DEBUG, $crate::EventTag::AdminDebug, $($arg)*) }
}

#[macro_export]
macro_rules! admin_error {
    ($($arg:tt)*) => { $crate::tagged_event!(ERROR, $crate::EventTag::AdminError, $($arg)*) }
}

#[macro_export]
macro_rules! admin_warn {
    ($($arg:tt)*) => { $crate::tagged_event!(WARN, $crate::EventTag::AdminWarn, $($arg)*) }
}

#[macro_export]
macro_rules! admin_info {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::AdminInfo, $($arg)*) }
}

#[macro_export]
macro_rules! schema_error {
    ($($arg:tt)*) => { $crate::tagged_event!(ERROR, $crate::EventTag::SchemaError, $($arg)*) }
}

#[macro_export]
macro_rules! schema_warn {
    ($($arg:tt)*) => { $crate::tagged_event!(WARN, $crate::EventTag::SchemaWarn, $($arg)*) }
}

#[macro_export]
macro_rules! schema_info {
    ($($arg:tt)*) => { $crate::tagged_event!(INFO, $crate::EventTag::SchemaInfo, $($arg)*) }
}

#[macro_export]
macro_rules! cache_debug {
    ($($arg:tt)*) => { $crate::tagged_event!(DEBUG, $crate::EventTag::CacheDebug, $($arg)*) }
}

#[macro_export]
macro_rules! cache_trace {
    ($($arg:tt)*) => { $crate::tagged_event!(TRACE, $crate::EventTag::CacheTrace, $($arg)*) }
}

#[macro_export]
macro_rules! callback_error {
    ($($arg:tt)*) => { $crate::tagged_event!(ERROR, $crate::EventTag::CallbackError, $($arg)*) }
}

#[macro_export]
macro_rules! callback_warn {
    ($($arg:tt)*) => { $crate::tagged_event!(WARN, $crate::EventTag::CallbackWarn, $($arg)*) }
}
