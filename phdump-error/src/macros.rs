/// Немедленно возвращает ошибку (аналогично `anyhow::bail!`).
///
/// Макрос возвращает `Err(StackError)` из текущей функции. Поддерживает три
/// формы:
/// - `bail!(err)` - принимает уже готовый тип ошибки или
///   `StackError`-совместимый тип;
/// - `bail!(code, "msg")` - создаёт `GenericError` с кодом и сообщением;
/// - `bail!(code, "fmt {}", arg)` - форматирует сообщение.
///
/// Пример:
///
/// ```ignore
/// use phdump_error::{bail, PhdError};
///
/// fn check_tag(tag: u8) -> phdump_error::PhdResult<()> {
///     if tag != 2 {
///         bail!(PhdError::InvalidBodyTag { tag, offset: None });
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $msg:expr) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, $msg)
        ))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, format!($fmt, $($arg)*))
        ))
    };
}

/// Проверяет условие и вызывает `bail!`, если условие ложно.
///
/// Формы аналогичны `bail!`:
/// - `ensure!(cond, err)` - если `cond` ложно, выполняется `bail!(err)`.
/// - `ensure!(cond, code, "msg")` - если `cond` ложно, выполняется `bail!(code,
///   "msg")`.
/// - `ensure!(cond, code, "fmt {}", arg)` - форматированная форма.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
    ($cond:expr, $code:expr, $msg:expr) => {
        if !($cond) {
            $crate::bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($code, $fmt, $($arg)*);
        }
    };
}

/// Добавляет контекст к `Result`.
///
/// Если аргумент - `Ok(val)`, возвращает `Ok(val)`. Если `Err(e)`, преобразует
/// `e` в `StackError` и добавляет указанный контекст (через
/// `StackError::context`).
#[macro_export]
macro_rules! context {
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => Ok(val),
            Err(e) => Err($crate::StackError::from(e).context($msg)),
        }
    };
    ($result:expr, $fmt:expr, $($arg:tt)*) => {
        match $result {
            Ok(val) => Ok(val),
            Err(e) => Err($crate::StackError::from(e).context(format!($fmt, $($arg)*))),
        }
    };
}

/// Трейт-расширение для `Result`, добавляющее удобные методы контекстирования.
///
/// Позволяет вызывать `.context(...)` и `.with_context(...)` на результатах,
/// превращая ошибку в [`StackError`](crate::StackError) и приклеивая к ней
/// контекст.
pub trait ResultExt<T> {
    /// Добавляет контекст к ошибке: если `self` - `Err`, оборачивает ошибку в
    /// `StackError` и добавляет указанный контекст.
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>;

    /// Добавляет ленивый контекст (вызывается только в случае ошибки).
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<crate::StackError>,
{
    #[track_caller]
    fn context<C>(
        self,
        ctx: C,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.into().context(ctx))
    }

    #[track_caller]
    fn with_context<C, F>(
        self,
        f: F,
    ) -> Result<T, crate::StackError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
