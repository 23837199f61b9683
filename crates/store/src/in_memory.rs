use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bistro_auth::User;
use bistro_catalog::{Category, CategoryDraft, CategoryUpdate, Menu, MenuDraft, MenuPatch};
use bistro_core::{CategoryId, MenuId, OrderId, UserId};
use bistro_orders::{Order, OrderDraft, OrderStatus};

use super::r#trait::{CustomerOrderRow, NewUser, OwnerOrderRow, Store, StoreError};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    menus: BTreeMap<i64, Menu>,
    orders: BTreeMap<i64, Order>,
    next_user_id: i64,
    next_category_id: i64,
    next_menu_id: i64,
    next_order_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// In-memory store.
///
/// Intended for tests/dev. A single lock guards all tables, which makes the
/// category soft-delete cascade trivially atomic: no reader can observe the
/// category marked deleted while its menus are not.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.nickname == new.nickname) {
            return Err(StoreError::Conflict(format!(
                "nickname '{}' is already taken",
                new.nickname
            )));
        }

        let id = State::next_id(&mut state.next_user_id);
        let user = User {
            id: UserId::new(id),
            nickname: new.nickname,
            password_hash: new.password_hash,
            user_type: new.user_type,
            created_at: Utc::now(),
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id.as_i64()).cloned())
    }

    async fn user_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.nickname == nickname)
            .cloned())
    }

    async fn insert_category(
        &self,
        creator: UserId,
        draft: &CategoryDraft,
    ) -> Result<Category, StoreError> {
        let mut state = self.write()?;
        let id = State::next_id(&mut state.next_category_id);
        let category = Category {
            id: CategoryId::new(id),
            name: draft.name.clone(),
            order: draft.order,
            user_id: Some(creator),
            is_deleted: None,
        };
        state.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let state = self.read()?;
        let mut rows: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.is_active())
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.order, c.id));
        Ok(rows)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, StoreError> {
        let mut state = self.write()?;
        let category = state
            .categories
            .get_mut(&id.as_i64())
            .filter(|c| c.is_active())
            .ok_or(StoreError::NotFound("category"))?;

        category.name = update.name.clone();
        category.order = update.order;
        Ok(category.clone())
    }

    async fn soft_delete_category(
        &self,
        id: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        // One write guard spans both mutations: the cascade is atomic.
        let mut state = self.write()?;

        let category = state
            .categories
            .get_mut(&id.as_i64())
            .filter(|c| c.is_active())
            .ok_or(StoreError::NotFound("category"))?;
        category.is_deleted = Some(now);

        let mut cascaded = 0;
        for menu in state.menus.values_mut() {
            if menu.category_id == id && menu.is_active() {
                menu.is_deleted = Some(now);
                cascaded += 1;
            }
        }
        Ok(cascaded)
    }

    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .categories
            .get(&id.as_i64())
            .is_some_and(|c| c.is_active()))
    }

    async fn insert_menu(
        &self,
        category_id: CategoryId,
        draft: &MenuDraft,
    ) -> Result<Menu, StoreError> {
        let mut state = self.write()?;

        if !state
            .categories
            .get(&category_id.as_i64())
            .is_some_and(|c| c.is_active())
        {
            return Err(StoreError::NotFound("category"));
        }

        let id = State::next_id(&mut state.next_menu_id);
        let menu = Menu {
            id: MenuId::new(id),
            category_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            image: draft.image.clone(),
            price: draft.price,
            order: draft.order,
            status: draft.status,
            is_deleted: None,
        };
        state.menus.insert(id, menu.clone());
        Ok(menu)
    }

    async fn menu_in_category(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
    ) -> Result<Option<Menu>, StoreError> {
        Ok(self
            .read()?
            .menus
            .get(&menu_id.as_i64())
            .filter(|m| m.category_id == category_id && m.is_active())
            .cloned())
    }

    async fn menu_by_id(&self, menu_id: MenuId) -> Result<Option<Menu>, StoreError> {
        Ok(self
            .read()?
            .menus
            .get(&menu_id.as_i64())
            .filter(|m| m.is_active())
            .cloned())
    }

    async fn list_menus(&self, category_id: CategoryId) -> Result<Vec<Menu>, StoreError> {
        let state = self.read()?;
        let mut rows: Vec<Menu> = state
            .menus
            .values()
            .filter(|m| m.category_id == category_id && m.is_active())
            .cloned()
            .collect();
        rows.sort_by_key(|m| (m.order, m.id));
        Ok(rows)
    }

    async fn update_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        patch: &MenuPatch,
    ) -> Result<Menu, StoreError> {
        let mut state = self.write()?;
        let menu = state
            .menus
            .get_mut(&menu_id.as_i64())
            .filter(|m| m.category_id == category_id && m.is_active())
            .ok_or(StoreError::NotFound("menu"))?;

        patch.apply(menu);
        Ok(menu.clone())
    }

    async fn soft_delete_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let menu = state
            .menus
            .get_mut(&menu_id.as_i64())
            .filter(|m| m.category_id == category_id && m.is_active())
            .ok_or(StoreError::NotFound("menu"))?;

        menu.is_deleted = Some(now);
        Ok(())
    }

    async fn insert_order(
        &self,
        customer: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, StoreError> {
        let mut state = self.write()?;

        if !state
            .menus
            .get(&draft.menu_id.as_i64())
            .is_some_and(|m| m.is_active())
        {
            return Err(StoreError::NotFound("menu"));
        }

        let id = State::next_id(&mut state.next_order_id);
        let order = Order {
            id: OrderId::new(id),
            menu_id: draft.menu_id,
            user_id: customer,
            quantity: draft.quantity,
            status: OrderStatus::pending(),
            created_at: Utc::now(),
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn orders_for_customer(
        &self,
        customer: UserId,
    ) -> Result<Vec<CustomerOrderRow>, StoreError> {
        let state = self.read()?;
        let mut rows: Vec<CustomerOrderRow> = state
            .orders
            .values()
            .filter(|o| o.user_id == customer)
            .filter_map(|o| {
                let menu = state.menus.get(&o.menu_id.as_i64())?;
                Some(CustomerOrderRow {
                    order: o.clone(),
                    menu_name: menu.name.clone(),
                    menu_price: menu.price,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            (b.order.created_at, b.order.id).cmp(&(a.order.created_at, a.order.id))
        });
        Ok(rows)
    }

    async fn orders_for_owner(&self) -> Result<Vec<OwnerOrderRow>, StoreError> {
        let state = self.read()?;
        let mut rows: Vec<OwnerOrderRow> = state
            .orders
            .values()
            .filter_map(|o| {
                let menu = state.menus.get(&o.menu_id.as_i64())?;
                let customer = state.users.get(&o.user_id.as_i64())?;
                Some(OwnerOrderRow {
                    order: o.clone(),
                    menu_name: menu.name.clone(),
                    menu_price: menu.price,
                    customer_id: customer.id,
                    customer_nickname: customer.nickname.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            (b.order.created_at, b.order.id).cmp(&(a.order.created_at, a.order.id))
        });
        Ok(rows)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut state = self.write()?;
        let order = state
            .orders
            .get_mut(&id.as_i64())
            .ok_or(StoreError::NotFound("order"))?;

        order.status = status.clone();
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_auth::Role;

    fn new_user(nickname: &str, role: Role) -> NewUser {
        NewUser {
            nickname: nickname.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            user_type: role,
        }
    }

    fn category_draft(name: &str, order: i32) -> CategoryDraft {
        CategoryDraft::new(name, Some(order)).unwrap()
    }

    fn menu_draft(name: &str, price: i64, order: i32) -> MenuDraft {
        MenuDraft::new(name, "a dish", "/img.png", price, Some(order), None).unwrap()
    }

    async fn owner(store: &InMemoryStore) -> User {
        store.create_user(new_user("chef", Role::Owner)).await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_nickname_conflicts() {
        let store = InMemoryStore::new();
        store.create_user(new_user("chef", Role::Owner)).await.unwrap();

        let err = store.create_user(new_user("chef", Role::Customer)).await.unwrap_err();
        match err {
            StoreError::Conflict(_) => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn categories_list_in_display_order() {
        let store = InMemoryStore::new();
        let owner = owner(&store).await;

        store.insert_category(owner.id, &category_draft("Soups", 2)).await.unwrap();
        store.insert_category(owner.id, &category_draft("Noodles", 1)).await.unwrap();

        let listed = store.list_categories().await.unwrap();
        let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Noodles", "Soups"]);
    }

    #[tokio::test]
    async fn soft_deleted_category_disappears_from_reads() {
        let store = InMemoryStore::new();
        let owner = owner(&store).await;
        let category = store
            .insert_category(owner.id, &category_draft("Soups", 1))
            .await
            .unwrap();

        store.soft_delete_category(category.id, Utc::now()).await.unwrap();

        assert!(store.list_categories().await.unwrap().is_empty());
        assert!(!store.category_exists(category.id).await.unwrap());

        let err = store
            .update_category(category.id, &CategoryUpdate::new("Grill", Some(1)).unwrap())
            .await
            .unwrap_err();
        match err {
            StoreError::NotFound("category") => {}
            other => panic!("expected NotFound(category), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cascade_marks_every_active_menu() {
        let store = InMemoryStore::new();
        let owner = owner(&store).await;
        let category = store
            .insert_category(owner.id, &category_draft("Soups", 1))
            .await
            .unwrap();

        let kept = store.insert_menu(category.id, &menu_draft("Kimchi stew", 9000, 1)).await.unwrap();
        let gone = store.insert_menu(category.id, &menu_draft("Miso soup", 4000, 2)).await.unwrap();
        // Already-deleted menus keep their original timestamp.
        let earlier = Utc::now();
        store.soft_delete_menu(category.id, gone.id, earlier).await.unwrap();

        let cascaded = store.soft_delete_category(category.id, Utc::now()).await.unwrap();
        assert_eq!(cascaded, 1);

        assert!(store.menu_by_id(kept.id).await.unwrap().is_none());
        assert!(store.list_menus(category.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn menu_lookup_is_scoped_to_its_category() {
        let store = InMemoryStore::new();
        let owner = owner(&store).await;
        let soups = store.insert_category(owner.id, &category_draft("Soups", 1)).await.unwrap();
        let grill = store.insert_category(owner.id, &category_draft("Grill", 2)).await.unwrap();
        let menu = store.insert_menu(soups.id, &menu_draft("Kimchi stew", 9000, 1)).await.unwrap();

        assert!(store.menu_in_category(soups.id, menu.id).await.unwrap().is_some());
        assert!(store.menu_in_category(grill.id, menu.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn customer_orders_come_back_newest_first_with_menu_data() {
        let store = InMemoryStore::new();
        let owner = owner(&store).await;
        let diner = store.create_user(new_user("diner", Role::Customer)).await.unwrap();
        let category = store.insert_category(owner.id, &category_draft("Soups", 1)).await.unwrap();
        let menu = store.insert_menu(category.id, &menu_draft("Kimchi stew", 9000, 1)).await.unwrap();

        let first = store
            .insert_order(diner.id, &OrderDraft::new(menu.id, 1).unwrap())
            .await
            .unwrap();
        let second = store
            .insert_order(diner.id, &OrderDraft::new(menu.id, 2).unwrap())
            .await
            .unwrap();

        let rows = store.orders_for_customer(diner.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order.id, second.id);
        assert_eq!(rows[1].order.id, first.id);
        assert_eq!(rows[0].menu_name, "Kimchi stew");
        assert_eq!(rows[0].menu_price, 9000);
    }

    #[tokio::test]
    async fn owner_listing_sees_all_customers() {
        let store = InMemoryStore::new();
        let owner_user = owner(&store).await;
        let a = store.create_user(new_user("alice", Role::Customer)).await.unwrap();
        let b = store.create_user(new_user("bob", Role::Customer)).await.unwrap();
        let category = store.insert_category(owner_user.id, &category_draft("Soups", 1)).await.unwrap();
        let menu = store.insert_menu(category.id, &menu_draft("Kimchi stew", 9000, 1)).await.unwrap();

        store.insert_order(a.id, &OrderDraft::new(menu.id, 1).unwrap()).await.unwrap();
        store.insert_order(b.id, &OrderDraft::new(menu.id, 3).unwrap()).await.unwrap();

        let rows = store.orders_for_owner().await.unwrap();
        assert_eq!(rows.len(), 2);
        let nicknames: Vec<&str> = rows.iter().map(|r| r.customer_nickname.as_str()).collect();
        assert!(nicknames.contains(&"alice"));
        assert!(nicknames.contains(&"bob"));
    }

    #[tokio::test]
    async fn order_status_overwrite_requires_existing_order() {
        let store = InMemoryStore::new();
        let err = store
            .update_order_status(OrderId::new(99), &OrderStatus::new("DONE"))
            .await
            .unwrap_err();
        match err {
            StoreError::NotFound("order") => {}
            other => panic!("expected NotFound(order), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ordering_a_missing_menu_fails() {
        let store = InMemoryStore::new();
        let diner = store.create_user(new_user("diner", Role::Customer)).await.unwrap();

        let err = store
            .insert_order(diner.id, &OrderDraft::new(MenuId::new(404), 1).unwrap())
            .await
            .unwrap_err();
        match err {
            StoreError::NotFound("menu") => {}
            other => panic!("expected NotFound(menu), got {other:?}"),
        }
    }
}
