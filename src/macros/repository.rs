/// Declare a typed repository whose methods are derived finders.
///
/// Each `fn` names a finder; its parameters become the value parameters of
/// the [`Signature`](crate::query::signature::Signature) and its return type
/// picks the multiplicity (`Vec<_>` for `FindAllBy…`, the entity for
/// `FindBy…`). Every generated method takes the
/// [`QueryContext`](crate::context::QueryContext) first.
///
/// All finders are validated when the repository is constructed, so a
/// misspelled column or a wrong parameter count is reported by `new`.
///
/// # Example
/// ```ignore
/// lifequery::repository! {
///     pub struct UserRepository<User> {
///         fn FindByUserName(user_name: String) -> User;
///         fn FindAllByStatusInOrderByIdDesc(statuses: Vec<String>) -> Vec<User>;
///     }
/// }
///
/// let users = UserRepository::new(PostgresStore::open(&config)?)?;
/// let ada = users.FindByUserName(&ctx, "ada".to_string())?;
/// ```
#[macro_export]
macro_rules! repository {
    (
        $(#[$meta:meta])*
        $vis:vis struct $repo:ident < $entity:ty > {
            $(
                $(#[$fmeta:meta])*
                fn $name:ident ( $($arg:ident : $ty:ty),* $(,)? ) -> $ret:ident $(< $inner:ty >)? ;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $repo<S> {
            inner: $crate::Repository<$entity, S>,
        }

        impl<S> $repo<S>
        where
            S: $crate::store::EntityStore<$entity> + 'static,
        {
            /// Bind every finder against `store`
            $vis fn new(
                store: impl ::std::convert::Into<::std::sync::Arc<S>>,
            ) -> ::std::result::Result<Self, $crate::query::error::BindError> {
                let inner = $crate::Repository::<$entity, S>::builder(store)
                    $(
                        .finder(
                            stringify!($name),
                            $crate::query::signature::Signature::new()
                                .context()
                                $(.value(<$ty as $crate::query::binder::IntoArg>::KIND))*
                                .returns($crate::__finder_returns!($ret $($inner)?))
                                .error(),
                        )
                    )*
                    .build()?;
                Ok(Self { inner })
            }

            $vis fn repository(&self) -> &$crate::Repository<$entity, S> {
                &self.inner
            }

            $(
                $(#[$fmeta])*
                #[allow(non_snake_case)]
                $vis fn $name(
                    &self,
                    ctx: &$crate::context::QueryContext,
                    $($arg: $ty),*
                ) -> ::std::result::Result<$ret $(< $inner >)?, $crate::query::error::CallError> {
                    let args: ::std::vec::Vec<$crate::query::binder::Arg> =
                        ::std::vec![$($crate::query::binder::IntoArg::into_arg($arg)),*];
                    $crate::__finder_call!(self.inner, stringify!($name), ctx, &args; $ret $($inner)?)
                }
            )*
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __finder_returns {
    ($ret:ident) => {
        $crate::query::signature::ReturnKind::Single
    };
    ($ret:ident $inner:ty) => {
        $crate::query::signature::ReturnKind::Sequence
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __finder_call {
    ($repo:expr, $name:expr, $ctx:expr, $args:expr; $ret:ident) => {
        $repo.find_one($name, $ctx, $args)
    };
    ($repo:expr, $name:expr, $ctx:expr, $args:expr; $ret:ident $inner:ty) => {
        $repo.find_many($name, $ctx, $args)
    };
}
